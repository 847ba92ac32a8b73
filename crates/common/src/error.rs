/// §7's error kinds, shared by every component so callers can match on a
/// stable taxonomy regardless of which crate raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MisconfiguredGenesis,
    EventNotApplicable,
    StateDivergence,
    RpcTransient,
    RpcPermanent,
    TxNonceMismatch,
    DiscoveryNoFixedPoint,
    ProofGenerationFailed,
    L1SubmissionReverted,
    RegisteredResponseStale,
}

impl ErrorKind {
    /// Whether the caller may retry the operation that produced this error,
    /// per the handling column of §7's table.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ErrorKind::RpcTransient
                | ErrorKind::TxNonceMismatch
                | ErrorKind::DiscoveryNoFixedPoint
                | ErrorKind::RegisteredResponseStale
        )
    }

    /// Whether the error should halt the owning subsystem rather than be
    /// absorbed locally.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::MisconfiguredGenesis | ErrorKind::StateDivergence
        )
    }
}
