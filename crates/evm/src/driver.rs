use crate::error::EvmDriverError;
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use rollup_rpc_client::CallFrame;

/// Thin adaptor over an EVM implementation, reached only through its
/// JSON-RPC surface (§4.5). Both the Fullnode's canonical EVM and the
/// Builder's private scratch EVM are driven through this trait; neither
/// side embeds an interpreter.
///
/// Snapshot/revert MUST be exact: after `revert_to`, `state_root` returns
/// the identical value it returned before the matching `snapshot` call.
/// The driver never advances block timestamp or number except when
/// explicitly committing one derived L2 block per L1 event.
#[async_trait]
pub trait L2ExecutionDriver: Send + Sync {
    /// Submits an already-signed, RLP-encoded transaction for inclusion
    /// in the next mined block.
    async fn execute_raw_tx(&self, raw_tx: &[u8]) -> Result<H256, EvmDriverError>;

    /// Sends a call from `sender` without a signature, impersonating the
    /// account. Used exclusively for System Address privileged
    /// operations (§4.1.2, §4.1.3): genesis deployment, proxy deploys,
    /// Call Registry mutation.
    async fn send_privileged(
        &self,
        sender: Address,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
    ) -> Result<H256, EvmDriverError>;

    /// Mines exactly one block containing every transaction queued since
    /// the last mine, with the given timestamp. The timestamp MUST come
    /// from the containing L1 event's block (§9), never wall-clock.
    async fn mine_block(&self, timestamp: u64) -> Result<(), EvmDriverError>;

    /// Takes a snapshot of current EVM state, returning an opaque id.
    async fn snapshot(&self) -> Result<String, EvmDriverError>;

    /// Reverts to a previously taken snapshot. MUST restore an identical
    /// state root.
    async fn revert_to(&self, snapshot_id: &str) -> Result<(), EvmDriverError>;

    /// The state root of the latest committed block.
    async fn state_root(&self) -> Result<H256, EvmDriverError>;

    /// Current nonce of `address` against latest state, used by the
    /// derivation engine to track the System Address's privileged-op
    /// counter and by the submitter to track its own signing key.
    async fn get_nonce(&self, address: Address) -> Result<u64, EvmDriverError>;

    async fn set_balance(&self, address: Address, balance: U256) -> Result<(), EvmDriverError>;

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, EvmDriverError>;

    /// Traces a prospective call with a call tracer, without committing
    /// any state change, so the discovery engine can walk the resulting
    /// tree for unresolved Call Registry consultations (§4.3.1 step 2a,
    /// §4.3.2 step 1).
    async fn trace_call(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Result<CallFrame, EvmDriverError>;

    /// Reads the would-be return data of a call without committing any
    /// state change (an `eth_call` against latest state), used by
    /// incoming-call discovery to predict the value an L1→L2 proxy would
    /// hand back to its L1 caller (§4.3.2 step 3).
    async fn call_readonly(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, EvmDriverError>;
}
