use rollup_common::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("signing key missing or malformed")]
    KeyUnavailable,
    #[error("recoverable signature could not be parsed into a fixed-size signature")]
    MalformedSignature,
    #[error("proof verification failed: recovered signer does not match the expected admin key")]
    VerificationFailed,
}

impl ProofError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ProofGenerationFailed
    }
}
