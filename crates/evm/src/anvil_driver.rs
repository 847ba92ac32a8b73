use crate::driver::L2ExecutionDriver;
use crate::error::EvmDriverError;
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use rollup_rpc_client::{BlockIdentifier, CallFrame, CallRequest, RpcClient};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// The reference `L2ExecutionDriver` binding, targeting an Anvil-
/// compatible node (§4.5.1). Automine is disabled once on construction
/// so that every block corresponds to exactly one applied L1 event.
pub struct AnvilDriver {
    client: RpcClient,
    automine_disabled: AtomicBool,
}

impl AnvilDriver {
    pub fn new(client: RpcClient) -> Self {
        Self {
            client,
            automine_disabled: AtomicBool::new(false),
        }
    }

    async fn ensure_automine_disabled(&self) -> Result<(), EvmDriverError> {
        if !self.automine_disabled.swap(true, Ordering::SeqCst) {
            self.client.evm_set_automine(false).await?;
            debug!("disabled automine on L2 node");
        }
        Ok(())
    }
}

#[async_trait]
impl L2ExecutionDriver for AnvilDriver {
    async fn execute_raw_tx(&self, raw_tx: &[u8]) -> Result<H256, EvmDriverError> {
        self.ensure_automine_disabled().await?;
        let hash = self.client.send_raw_transaction(raw_tx).await?;
        Ok(hash)
    }

    async fn send_privileged(
        &self,
        sender: Address,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
    ) -> Result<H256, EvmDriverError> {
        self.ensure_automine_disabled().await?;
        self.client.anvil_impersonate_account(sender).await?;
        let request = CallRequest {
            from: Some(sender),
            to,
            value: Some(value),
            data,
        };
        let hash = self.client.send_impersonated(request).await?;
        self.client
            .anvil_stop_impersonating_account(sender)
            .await?;
        Ok(hash)
    }

    async fn mine_block(&self, timestamp: u64) -> Result<(), EvmDriverError> {
        self.ensure_automine_disabled().await?;
        self.client.evm_mine_at(timestamp).await?;
        info!(timestamp, "mined one L2 block");
        Ok(())
    }

    async fn snapshot(&self) -> Result<String, EvmDriverError> {
        Ok(self.client.evm_snapshot().await?)
    }

    async fn revert_to(&self, snapshot_id: &str) -> Result<(), EvmDriverError> {
        let reverted = self.client.evm_revert(snapshot_id).await?;
        if !reverted {
            return Err(EvmDriverError::UnknownSnapshot(snapshot_id.to_string()));
        }
        Ok(())
    }

    async fn state_root(&self) -> Result<H256, EvmDriverError> {
        let block = self
            .client
            .get_block_by_number(BlockIdentifier::Latest)
            .await?
            .ok_or(EvmDriverError::MissingStateRoot)?;
        Ok(block.state_root)
    }

    async fn get_nonce(&self, address: Address) -> Result<u64, EvmDriverError> {
        Ok(self
            .client
            .get_transaction_count(address, BlockIdentifier::Latest)
            .await?)
    }

    async fn set_balance(&self, address: Address, balance: U256) -> Result<(), EvmDriverError> {
        self.client.anvil_set_balance(address, balance).await?;
        Ok(())
    }

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, EvmDriverError> {
        Ok(self.client.get_code(address, BlockIdentifier::Latest).await?)
    }

    async fn trace_call(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Result<CallFrame, EvmDriverError> {
        let request = CallRequest {
            from: Some(from),
            to: Some(to),
            value: Some(value),
            data,
        };
        Ok(self.client.trace_call(request, BlockIdentifier::Latest).await?)
    }

    async fn call_readonly(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, EvmDriverError> {
        let request = CallRequest {
            from: Some(from),
            to: Some(to),
            value: Some(value),
            data,
        };
        Ok(self.client.call(request, BlockIdentifier::Latest).await?)
    }
}
