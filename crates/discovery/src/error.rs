use rollup_common::error::ErrorKind;
use rollup_derivation::DerivationError;
use rollup_evm::EvmDriverError;
use rollup_rpc_client::RpcClientError;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("derivation error during discovery: {0}")]
    Derivation(#[from] DerivationError),
    #[error("evm driver error during discovery: {0}")]
    Evm(#[from] EvmDriverError),
    #[error("l1 rpc error during discovery: {0}")]
    Rpc(#[from] RpcClientError),
    #[error("discovery did not reach a fixed point within {iterations} iterations")]
    NoFixedPoint { iterations: u32 },
    #[error("simulated l1 response changed between discovery iterations, L1 state drifted mid-discovery")]
    L1StateDrift,
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::Derivation(e) => e.kind(),
            DiscoveryError::Evm(e) => e.kind(),
            DiscoveryError::Rpc(e) => e.kind(),
            DiscoveryError::NoFixedPoint { .. } => ErrorKind::DiscoveryNoFixedPoint,
            DiscoveryError::L1StateDrift => ErrorKind::DiscoveryNoFixedPoint,
        }
    }
}
