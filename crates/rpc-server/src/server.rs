//! Axum wiring for both served surfaces (§6.1), matching the teacher's
//! `server.rs`: one POST route accepting a single request or a batch,
//! permissive CORS, graceful shutdown on Ctrl+C. The Fullnode and
//! Builder surfaces differ only in their context type and dispatch
//! function, so each gets its own thin `serve_*` entry point rather than
//! forcing both through one generic router.
use crate::context::{BuilderContext, FullnodeContext};
use crate::error::RpcErr;
use crate::router::{map_builder_request, map_fullnode_request};
use crate::types::{RpcErrorObject, RpcErrorResponse, RpcRequestId, RpcRequestWrapper, RpcSuccessResponse};
use axum::extract::State;
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

pub fn rpc_response(id: RpcRequestId, result: Result<Value, RpcErr>) -> Value {
    match result {
        Ok(result) => serde_json::to_value(RpcSuccessResponse {
            id,
            jsonrpc: "2.0",
            result,
        }),
        Err(err) => serde_json::to_value(RpcErrorResponse {
            id,
            jsonrpc: "2.0",
            error: RpcErrorObject::from(err),
        }),
    }
    .expect("rpc envelopes always serialize")
}

async fn handle_fullnode_request(
    State(ctx): State<FullnodeContext>,
    body: String,
) -> Json<Value> {
    let response = match serde_json::from_str::<RpcRequestWrapper>(&body) {
        Ok(RpcRequestWrapper::Single(req)) => {
            let result = map_fullnode_request(&req, &ctx).await;
            rpc_response(req.id, result)
        }
        Ok(RpcRequestWrapper::Batch(requests)) => {
            let mut responses = Vec::with_capacity(requests.len());
            for req in requests {
                let result = map_fullnode_request(&req, &ctx).await;
                responses.push(rpc_response(req.id.clone(), result));
            }
            Value::Array(responses)
        }
        Err(_) => rpc_response(
            RpcRequestId::Null,
            Err(RpcErr::BadParams("invalid request body".to_string())),
        ),
    };
    Json(response)
}

async fn handle_builder_request(
    State(ctx): State<BuilderContext>,
    body: String,
) -> Json<Value> {
    let response = match serde_json::from_str::<RpcRequestWrapper>(&body) {
        Ok(RpcRequestWrapper::Single(req)) => {
            let result = map_builder_request(&req, &ctx).await;
            rpc_response(req.id, result)
        }
        Ok(RpcRequestWrapper::Batch(requests)) => {
            let mut responses = Vec::with_capacity(requests.len());
            for req in requests {
                let result = map_builder_request(&req, &ctx).await;
                responses.push(rpc_response(req.id.clone(), result));
            }
            Value::Array(responses)
        }
        Err(_) => rpc_response(
            RpcRequestId::Null,
            Err(RpcErr::BadParams("invalid request body".to_string())),
        ),
    };
    Json(response)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl+c handler");
}

/// Serves the Fullnode's `eth_*` read surface at `addr` until Ctrl+C.
pub async fn serve_fullnode(addr: SocketAddr, ctx: FullnodeContext) -> std::io::Result<()> {
    let router = Router::new()
        .route("/", axum::routing::post(handle_fullnode_request))
        .layer(CorsLayer::permissive())
        .with_state(ctx);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "starting fullnode rpc server");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Serves the Builder's `submit`/`status` surface at `addr` until Ctrl+C.
pub async fn serve_builder(addr: SocketAddr, ctx: BuilderContext) -> std::io::Result<()> {
    let router = Router::new()
        .route("/", axum::routing::post(handle_builder_request))
        .layer(CorsLayer::permissive())
        .with_state(ctx);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "starting builder rpc server");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
