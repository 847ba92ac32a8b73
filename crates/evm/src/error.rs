use rollup_common::error::ErrorKind;
use rollup_rpc_client::RpcClientError;

#[derive(Debug, thiserror::Error)]
pub enum EvmDriverError {
    #[error("rpc error driving L2 evm: {0}")]
    Rpc(#[from] RpcClientError),
    #[error("raw transaction was rejected: {0}")]
    TransactionRejected(String),
    #[error("snapshot {0} was not found or already reverted")]
    UnknownSnapshot(String),
    #[error("latest block had no state root")]
    MissingStateRoot,
}

impl EvmDriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvmDriverError::Rpc(e) => e.kind(),
            EvmDriverError::TransactionRejected(_) => ErrorKind::TxNonceMismatch,
            EvmDriverError::UnknownSnapshot(_) => ErrorKind::RpcPermanent,
            EvmDriverError::MissingStateRoot => ErrorKind::RpcPermanent,
        }
    }
}
