//! JSON-RPC 2.0 envelope types, the wire format of §6's served surfaces.
//! Mirrors the teacher's `rpc_types` module: a request carries an
//! arbitrary id the client chose and gets it back verbatim on either a
//! `result` or an `error` response, never both.
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: RpcRequestId,
    pub method: String,
    #[serde(default)]
    pub params: Option<Vec<Value>>,
}

/// JSON-RPC ids are untyped on the wire; most clients send a number, some
/// send a string, and a rare few omit it entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcRequestId {
    Number(i64),
    String(String),
    #[default]
    Null,
}

/// Accepts either one request or a JSON-RPC batch, the same shape the
/// teacher's `RpcRequestWrapper` parses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RpcRequestWrapper {
    Single(RpcRequest),
    Batch(Vec<RpcRequest>),
}

#[derive(Debug, Serialize)]
pub struct RpcSuccessResponse {
    pub id: RpcRequestId,
    pub jsonrpc: &'static str,
    pub result: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcErrorResponse {
    pub id: RpcRequestId,
    pub jsonrpc: &'static str,
    pub error: RpcErrorObject,
}

#[derive(Debug, Serialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}
