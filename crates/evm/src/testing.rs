//! An in-memory `L2ExecutionDriver` double so derivation-engine tests can
//! exercise the determinism invariants without a live Anvil process
//! (§2.1, §8). It models only what the derivation engine actually reads:
//! nonces, balances, code presence, and a state root that changes
//! deterministically with every mined block so tests can assert on
//! prev/new root transitions.
use crate::driver::L2ExecutionDriver;
use crate::error::EvmDriverError;
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use rollup_common::hashing::{concat, keccak256};
use rollup_rpc_client::CallFrame;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// `deployProxy(address)`'s selector, matched against inbound calldata so
/// this double can place code at the same CREATE2 address the real
/// `ProxyFactory` would (§4.6, `rollup_contracts::l1_to_l2_proxy_address`)
/// without running an actual EVM.
fn deploy_proxy_selector() -> [u8; 4] {
    let hash = keccak256(b"deployProxy(address)".as_slice());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

#[derive(Debug, Default, Clone)]
struct Account {
    nonce: u64,
    balance: U256,
    code: Vec<u8>,
}

struct Inner {
    accounts: HashMap<Address, Account>,
    pending_tx_hashes: Vec<H256>,
    root: H256,
    snapshots: HashMap<String, (HashMap<Address, Account>, H256)>,
    next_snapshot_id: u64,
    /// Scripted `trace_call` responses, consumed in order. Lets a
    /// discovery test drive the exact call tree it wants to exercise
    /// without a real tracing EVM.
    scripted_traces: VecDeque<CallFrame>,
    /// Scripted `call_readonly` responses, consumed in order.
    scripted_call_results: VecDeque<Vec<u8>>,
}

/// A single-process stand-in for an Anvil node. Every write is applied
/// immediately except that `mine_block` is what advances the externally
/// observable state root, mirroring the real driver's one-root-per-block
/// contract.
pub struct FakeEvmDriver {
    inner: Mutex<Inner>,
}

impl Default for FakeEvmDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEvmDriver {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                accounts: HashMap::new(),
                pending_tx_hashes: Vec::new(),
                root: H256::zero(),
                snapshots: HashMap::new(),
                next_snapshot_id: 0,
                scripted_traces: VecDeque::new(),
                scripted_call_results: VecDeque::new(),
            }),
        }
    }

    /// Test hook: seeds code at `address` as if a contract had been
    /// deployed there, without going through a real CREATE/CREATE2.
    pub fn seed_code(&self, address: Address, code: Vec<u8>) {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        inner.accounts.entry(address).or_default().code = code;
    }

    pub fn seed_balance(&self, address: Address, balance: U256) {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        inner.accounts.entry(address).or_default().balance = balance;
    }

    /// Queues the `CallFrame` the next `trace_call` invocation should
    /// return. Discovery tests script a sequence of these to simulate a
    /// fixed-point loop converging over successive iterations.
    pub fn push_scripted_trace(&self, frame: CallFrame) {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        inner.scripted_traces.push_back(frame);
    }

    /// Queues the next `call_readonly` result.
    pub fn push_scripted_call_result(&self, result: Vec<u8>) {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        inner.scripted_call_results.push_back(result);
    }
}

#[async_trait]
impl L2ExecutionDriver for FakeEvmDriver {
    async fn execute_raw_tx(&self, raw_tx: &[u8]) -> Result<H256, EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        let hash = keccak256(raw_tx);
        inner.pending_tx_hashes.push(hash);
        Ok(hash)
    }

    async fn send_privileged(
        &self,
        sender: Address,
        to: Option<Address>,
        _value: U256,
        data: Vec<u8>,
    ) -> Result<H256, EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        let nonce_before = inner.accounts.entry(sender).or_default().nonce;
        inner.accounts.get_mut(&sender).expect("just inserted").nonce += 1;

        match to {
            // A bare contract-creation call (genesis deploys of R and F):
            // place code at the standard CREATE address so a later
            // `get_code` on that address (computed the same way by
            // `rollup_contracts::call_registry_address`/`proxy_factory_address`)
            // finds it.
            None => {
                let created = rollup_contracts::call_registry_address(sender, nonce_before);
                inner.accounts.entry(created).or_default().code = vec![0x60];
            }
            // A `ProxyFactory.deployProxy(address)` call against a target
            // that already has code: place code at the CREATE2 address
            // the real factory would deploy to (§4.6), so
            // `ensure_l1_to_l2_proxy`'s existence check behaves the same
            // way it would against a live Anvil instance.
            Some(target) => {
                let has_factory_code = inner
                    .accounts
                    .get(&target)
                    .map(|a| !a.code.is_empty())
                    .unwrap_or(false);
                let selector = deploy_proxy_selector();
                if has_factory_code && data.len() == 36 && data[..4] == selector {
                    let l1_caller = Address::from_slice(&data[16..36]);
                    let registry = rollup_contracts::call_registry_address(sender, 0);
                    let proxy = rollup_contracts::l1_to_l2_proxy_address(
                        target, sender, l1_caller, registry,
                    );
                    inner.accounts.entry(proxy).or_default().code = vec![0x60];
                }
            }
        }

        let preimage = concat(&[
            sender.as_bytes(),
            to.unwrap_or_default().as_bytes(),
            &data,
        ]);
        let hash = keccak256(preimage);
        inner.pending_tx_hashes.push(hash);
        Ok(hash)
    }

    async fn mine_block(&self, timestamp: u64) -> Result<(), EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        let mut preimage = inner.root.as_bytes().to_vec();
        for hash in inner.pending_tx_hashes.drain(..) {
            preimage.extend_from_slice(hash.as_bytes());
        }
        preimage.extend_from_slice(&timestamp.to_be_bytes());
        inner.root = keccak256(preimage);
        Ok(())
    }

    async fn snapshot(&self) -> Result<String, EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        let id = inner.next_snapshot_id;
        inner.next_snapshot_id += 1;
        let id = id.to_string();
        let accounts = inner.accounts.clone();
        let root = inner.root;
        inner.snapshots.insert(id.clone(), (accounts, root));
        Ok(id)
    }

    async fn revert_to(&self, snapshot_id: &str) -> Result<(), EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        let (accounts, root) = inner
            .snapshots
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| EvmDriverError::UnknownSnapshot(snapshot_id.to_string()))?;
        inner.accounts = accounts;
        inner.root = root;
        inner.pending_tx_hashes.clear();
        Ok(())
    }

    async fn state_root(&self) -> Result<H256, EvmDriverError> {
        Ok(self.inner.lock().expect("fake evm lock poisoned").root)
    }

    async fn get_nonce(&self, address: Address) -> Result<u64, EvmDriverError> {
        Ok(self
            .inner
            .lock()
            .expect("fake evm lock poisoned")
            .accounts
            .get(&address)
            .map(|a| a.nonce)
            .unwrap_or_default())
    }

    async fn set_balance(&self, address: Address, balance: U256) -> Result<(), EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        inner.accounts.entry(address).or_default().balance = balance;
        Ok(())
    }

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, EvmDriverError> {
        Ok(self
            .inner
            .lock()
            .expect("fake evm lock poisoned")
            .accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default())
    }

    async fn trace_call(
        &self,
        _from: Address,
        _to: Address,
        _value: U256,
        _data: Vec<u8>,
    ) -> Result<CallFrame, EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        Ok(inner.scripted_traces.pop_front().unwrap_or(CallFrame {
            kind: "CALL".to_string(),
            from: _from,
            to: Some(_to),
            input: _data,
            output: Vec::new(),
            value: Some(_value),
            error: None,
            calls: Vec::new(),
        }))
    }

    async fn call_readonly(
        &self,
        _from: Address,
        _to: Address,
        _value: U256,
        _data: Vec<u8>,
    ) -> Result<Vec<u8>, EvmDriverError> {
        let mut inner = self.inner.lock().expect("fake evm lock poisoned");
        Ok(inner.scripted_call_results.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_then_revert_restores_exact_root() {
        let driver = FakeEvmDriver::new();
        driver.mine_block(1000).await.unwrap();
        let root_before = driver.state_root().await.unwrap();

        let snap = driver.snapshot().await.unwrap();
        driver
            .send_privileged(Address::from_low_u64_be(1), None, U256::zero(), vec![1, 2, 3])
            .await
            .unwrap();
        driver.mine_block(1001).await.unwrap();
        assert_ne!(driver.state_root().await.unwrap(), root_before);

        driver.revert_to(&snap).await.unwrap();
        assert_eq!(driver.state_root().await.unwrap(), root_before);
    }

    #[tokio::test]
    async fn privileged_send_increments_sender_nonce() {
        let driver = FakeEvmDriver::new();
        let sender = Address::from_low_u64_be(42);
        assert_eq!(driver.get_nonce(sender).await.unwrap(), 0);
        driver
            .send_privileged(sender, None, U256::zero(), vec![])
            .await
            .unwrap();
        assert_eq!(driver.get_nonce(sender).await.unwrap(), 1);
    }
}
