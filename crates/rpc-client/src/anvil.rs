//! Anvil-specific RPC extensions used to drive the L2 node as a
//! privileged operator (§4.5.1): impersonation, balance/nonce overrides,
//! manual mining, and snapshot/revert for the Builder's discovery
//! simulations.
use crate::client::RpcClient;
use crate::error::RpcClientError;
use crate::types::CallRequest;
use ethereum_types::{Address, H256, U256};
use serde_json::json;

impl RpcClient {
    /// Sends an unsigned transaction from an impersonated sender via
    /// `eth_sendTransaction`, the Anvil-specific path privileged System
    /// Address operations use instead of a signed raw transaction
    /// (§4.1.2, §4.1.3).
    pub async fn send_impersonated(&self, request: CallRequest) -> Result<H256, RpcClientError> {
        self.rpc_call("eth_sendTransaction", json!([request])).await
    }

    pub async fn anvil_impersonate_account(&self, address: Address) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible =
            self.rpc_call("anvil_impersonateAccount", json!([address]))
                .await?;
        Ok(())
    }

    pub async fn anvil_stop_impersonating_account(
        &self,
        address: Address,
    ) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible =
            self.rpc_call("anvil_stopImpersonatingAccount", json!([address]))
                .await?;
        Ok(())
    }

    pub async fn anvil_set_balance(
        &self,
        address: Address,
        balance: U256,
    ) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible = self
            .rpc_call(
                "anvil_setBalance",
                json!([address, format!("0x{balance:x}")]),
            )
            .await?;
        Ok(())
    }

    pub async fn anvil_set_nonce(&self, address: Address, nonce: u64) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible = self
            .rpc_call("anvil_setNonce", json!([address, format!("0x{nonce:x}")]))
            .await?;
        Ok(())
    }

    pub async fn evm_set_automine(&self, enabled: bool) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible =
            self.rpc_call("evm_setAutomine", json!([enabled])).await?;
        Ok(())
    }

    pub async fn evm_mine(&self) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible = self.rpc_call("evm_mine", json!([])).await?;
        Ok(())
    }

    /// Mines exactly one block stamped with `timestamp`, the shape the
    /// derivation engine needs to bind each L2 block to its triggering
    /// L1 block's timestamp (§9).
    pub async fn evm_mine_at(&self, timestamp: u64) -> Result<(), RpcClientError> {
        let _: bool_or_null::Flexible = self
            .rpc_call("evm_mine", json!([{"timestamp": timestamp}]))
            .await?;
        Ok(())
    }

    /// Takes an EVM snapshot and returns its id, used by the discovery
    /// engine to roll back speculative simulations between fixed-point
    /// iterations (§4.3, §9).
    pub async fn evm_snapshot(&self) -> Result<String, RpcClientError> {
        self.rpc_call("evm_snapshot", json!([])).await
    }

    pub async fn evm_revert(&self, snapshot_id: &str) -> Result<bool, RpcClientError> {
        self.rpc_call("evm_revert", json!([snapshot_id])).await
    }
}

/// `anvil_*` mutation endpoints reply with either `true` or `null`
/// depending on client version; this adapter accepts both without the
/// caller needing to care.
mod bool_or_null {
    use serde::{Deserialize, Deserializer};

    pub struct Flexible;

    impl<'de> Deserialize<'de> for Flexible {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let _ = serde_json::Value::deserialize(deserializer)?;
            Ok(Flexible)
        }
    }
}
