use ethereum_types::H256;
use rollup_common::error::ErrorKind;
use rollup_common::tx::TxError;
use rollup_evm::EvmDriverError;

#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    #[error("genesis state root mismatch: expected {expected:#x}, observed {observed:#x}")]
    MisconfiguredGenesis { expected: H256, observed: H256 },

    #[error(
        "state divergence applying event at l1 block {l1_block_number} log {log_index}: expected {expected:#x}, observed {observed:#x}"
    )]
    StateDivergence {
        l1_block_number: u64,
        log_index: u64,
        expected: H256,
        observed: H256,
    },

    #[error("failed to decode l2 transaction: {0}")]
    TxDecode(#[from] TxError),

    #[error(transparent)]
    Evm(#[from] EvmDriverError),
}

impl DerivationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DerivationError::MisconfiguredGenesis { .. } => ErrorKind::MisconfiguredGenesis,
            DerivationError::StateDivergence { .. } => ErrorKind::StateDivergence,
            DerivationError::TxDecode(_) => ErrorKind::RpcPermanent,
            DerivationError::Evm(e) => e.kind(),
        }
    }
}
