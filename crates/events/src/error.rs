use rollup_common::error::ErrorKind;
use rollup_rpc_client::RpcClientError;

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("rpc error polling l1: {0}")]
    Rpc(#[from] RpcClientError),
    #[error("log at tx {tx_hash:#x} log index {log_index} could not be decoded: {reason}")]
    Decode {
        tx_hash: ethereum_types::H256,
        log_index: u64,
        reason: String,
    },
}

impl EventSourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventSourceError::Rpc(e) => e.kind(),
            EventSourceError::Decode { .. } => ErrorKind::RpcPermanent,
        }
    }
}
