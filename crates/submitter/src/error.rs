use rollup_common::error::ErrorKind;
use rollup_derivation::DerivationError;
use rollup_discovery::DiscoveryError;
use rollup_evm::EvmDriverError;
use rollup_proof::ProofError;
use rollup_rpc_client::RpcClientError;

/// §4.4 "Failure semantics" plus §7's taxonomy, specialized to the
/// submission pipeline. Every variant maps to exactly one §7 `ErrorKind`
/// so a caller can match on the stable taxonomy without depending on
/// this crate's exact enum shape.
#[derive(Debug, thiserror::Error)]
pub enum SubmitterError {
    #[error("submit nonce {submitted} disagrees with l2 account state (expected {expected})")]
    NonceMismatch { expected: u64, submitted: u64 },

    #[error("the builder's private derivation engine did not catch up to the l1 tip within the configured timeout")]
    SyncTimeout,

    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("derivation error while driving the private engine: {0}")]
    Derivation(#[from] DerivationError),

    #[error("evm driver error: {0}")]
    Evm(#[from] EvmDriverError),

    #[error("l1 rpc error: {0}")]
    Rpc(#[from] RpcClientError),

    #[error("proof generation failed: {0}")]
    Proof(#[from] ProofError),

    #[error("l1 rejected the submission: {reason}")]
    L1SubmissionReverted { reason: String },

    #[error("discovery state assumptions were invalidated by a concurrent l1 tip advance {attempts} times in a row")]
    StateRaceExhausted { attempts: u32 },

    #[error("failed to decode the submitted transaction: {0}")]
    TxDecode(#[from] rollup_common::tx::TxError),

    #[error("submit only accepts calls, not contract-creation transactions")]
    UnsupportedTransactionKind,

    #[error("submit hints did not name an l2 address for this l1-source call")]
    MissingL2Target,
}

impl SubmitterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitterError::NonceMismatch { .. } => ErrorKind::TxNonceMismatch,
            SubmitterError::SyncTimeout => ErrorKind::RpcTransient,
            SubmitterError::Discovery(e) => e.kind(),
            SubmitterError::Derivation(e) => e.kind(),
            SubmitterError::Evm(e) => e.kind(),
            SubmitterError::Rpc(e) => e.kind(),
            SubmitterError::Proof(_) => ErrorKind::ProofGenerationFailed,
            SubmitterError::L1SubmissionReverted { .. } => ErrorKind::L1SubmissionReverted,
            SubmitterError::StateRaceExhausted { .. } => ErrorKind::DiscoveryNoFixedPoint,
            SubmitterError::TxDecode(_) => ErrorKind::RpcPermanent,
            SubmitterError::UnsupportedTransactionKind => ErrorKind::RpcPermanent,
            SubmitterError::MissingL2Target => ErrorKind::RpcPermanent,
        }
    }

    /// Whether the caller (the Builder RPC handler) should report this as
    /// retriable to the submitting client (§7 propagation policy).
    pub fn is_retriable(&self) -> bool {
        self.kind().is_retriable()
    }
}
