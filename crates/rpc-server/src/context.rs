//! Shared state handed to every handler via axum's `State` extractor,
//! the same role the teacher's `RpcApiContext` plays: one clonable
//! struct wrapping whatever the namespace handlers need, never built
//! per-request.
use rollup_derivation::DerivationEngine;
use rollup_rpc_client::RpcClient;
use rollup_submitter::Submitter;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A small in-memory health snapshot, updated by the owning binary's main
/// loop, mirroring `L1WatcherHealth` in the teacher (§2.2 expansion).
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncHealth {
    pub caught_up: bool,
    pub last_l1_block_seen: u64,
    pub l2_block_number: u64,
}

/// The Fullnode's RPC surface reads the canonical engine's L2 node
/// directly over its own `RpcClient` rather than through
/// `L2ExecutionDriver`: the driver trait only exposes what the
/// derivation algorithm itself consumes, while `eth_getBalance` and
/// friends are plain reads any JSON-RPC node already answers.
#[derive(Clone)]
pub struct FullnodeContext {
    pub engine: Arc<RwLock<DerivationEngine>>,
    pub l2_client: RpcClient,
    pub health: Arc<RwLock<SyncHealth>>,
}

/// The Builder's RPC surface: `submit` reads the private engine under a
/// shared lock (discovery only needs `&DerivationEngine`) while the
/// background sync task that advances it takes the exclusive write side.
#[derive(Clone)]
pub struct BuilderContext {
    pub engine: Arc<RwLock<DerivationEngine>>,
    pub submitter: Arc<Submitter>,
    pub health: Arc<RwLock<SyncHealth>>,
}
