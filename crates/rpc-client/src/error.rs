use rollup_common::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    #[error("transport error calling {method}: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("JSON-RPC error calling {method}: {code} {message}")]
    JsonRpc {
        method: &'static str,
        code: i64,
        message: String,
    },
    #[error("malformed response decoding {method}: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("{method} exhausted its retry budget after {attempts} attempts")]
    RetriesExhausted { method: &'static str, attempts: u32 },
}

impl RpcClientError {
    /// Every transport-level failure and every JSON-RPC error except the
    /// canonical execution-revert code (3) is treated as retriable;
    /// reverts are a deterministic answer from the node, not a hiccup.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcClientError::Transport { .. } => ErrorKind::RpcTransient,
            RpcClientError::JsonRpc { code: 3, .. } => ErrorKind::RpcPermanent,
            RpcClientError::JsonRpc { .. } => ErrorKind::RpcTransient,
            RpcClientError::Decode { .. } => ErrorKind::RpcPermanent,
            RpcClientError::RetriesExhausted { .. } => ErrorKind::RpcTransient,
        }
    }
}
