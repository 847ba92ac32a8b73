//! JSON-RPC error mapping. Every handler error eventually becomes one
//! `RpcErr`, which knows how to render itself as the standard
//! `{code, message}` object. Dispatch-level errors (unknown method, bad
//! params) use the reserved JSON-RPC codes; everything raised by the
//! derivation/discovery/submitter stack reuses its §7 `ErrorKind`,
//! mapped into the `-32000` server-error range so retriable vs. fatal
//! failures are distinguishable without parsing the message string.
use crate::types::RpcErrorObject;
use rollup_common::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum RpcErr {
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    BadParams(String),
    #[error("{message}")]
    Application { code: i64, message: String },
}

impl RpcErr {
    fn code(&self) -> i64 {
        match self {
            RpcErr::MethodNotFound(_) => -32601,
            RpcErr::BadParams(_) => -32602,
            RpcErr::Application { code, .. } => *code,
        }
    }

    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        RpcErr::Application {
            code: kind_code(kind),
            message: message.into(),
        }
    }
}

/// `-32000`/`-32001` distinguish fatal from retriable at the
/// application layer, leaving `-32002..` free for anything else that
/// does not map cleanly to either.
fn kind_code(kind: ErrorKind) -> i64 {
    if kind.is_fatal() {
        -32000
    } else if kind.is_retriable() {
        -32001
    } else {
        -32002
    }
}

impl From<RpcErr> for RpcErrorObject {
    fn from(err: RpcErr) -> Self {
        RpcErrorObject {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<rollup_derivation::DerivationError> for RpcErr {
    fn from(e: rollup_derivation::DerivationError) -> Self {
        RpcErr::from_kind(e.kind(), e.to_string())
    }
}

impl From<rollup_evm::EvmDriverError> for RpcErr {
    fn from(e: rollup_evm::EvmDriverError) -> Self {
        RpcErr::from_kind(e.kind(), e.to_string())
    }
}

impl From<rollup_submitter::SubmitterError> for RpcErr {
    fn from(e: rollup_submitter::SubmitterError) -> Self {
        RpcErr::from_kind(e.kind(), e.to_string())
    }
}

impl From<rollup_rpc_client::RpcClientError> for RpcErr {
    fn from(e: rollup_rpc_client::RpcClientError) -> Self {
        RpcErr::from_kind(e.kind(), e.to_string())
    }
}
