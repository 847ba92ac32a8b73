//! Method-name dispatch, split one level short of the teacher's
//! namespace-prefix routing: this crate serves exactly two namespaces
//! (`eth_*` for the Fullnode, the two bare Builder methods), so there is
//! one dispatch function per served surface rather than a shared
//! namespace enum.
use crate::builder::map_builder_requests;
use crate::context::{BuilderContext, FullnodeContext};
use crate::error::RpcErr;
use crate::types::RpcRequest;
use serde_json::Value;

pub async fn map_fullnode_request(req: &RpcRequest, ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let params = req.params.as_deref().unwrap_or(&[]);
    crate::eth::map_eth_requests(&req.method, params, ctx).await
}

pub async fn map_builder_request(req: &RpcRequest, ctx: &BuilderContext) -> Result<Value, RpcErr> {
    let params = req.params.as_deref().unwrap_or(&[]);
    map_builder_requests(&req.method, params, ctx).await
}
