//! The Builder's RPC surface (§6): `submit` and `status`, the only two
//! methods this binary serves. `submit`'s request/response shapes are
//! exactly the ones named in §6, not a generic JSON-RPC passthrough, so
//! parsing lives here rather than behind `RpcHandler::parse` generics.
use crate::context::BuilderContext;
use crate::error::RpcErr;
use ethereum_types::Address;
use rollup_submitter::{SourceChain, SubmitHints, SubmitRequest};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn map_builder_requests(
    method: &str,
    params: &[Value],
    ctx: &BuilderContext,
) -> Result<Value, RpcErr> {
    match method {
        "submit" => submit(params, ctx).await,
        "status" => status(ctx).await,
        other => Err(RpcErr::MethodNotFound(other.to_string())),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitHintsWire {
    #[serde(default)]
    l2_addresses: Vec<Address>,
    #[serde(default)]
    l2_target_address: Option<Address>,
    #[serde(default)]
    is_contract_call: bool,
    #[serde(default)]
    known_l1_targets: Vec<Address>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitParams {
    signed_tx: String,
    source_chain: String,
    #[serde(default)]
    hints: Option<SubmitHintsWire>,
}

async fn submit(params: &[Value], ctx: &BuilderContext) -> Result<Value, RpcErr> {
    let body = params
        .first()
        .ok_or_else(|| RpcErr::BadParams("submit requires a request body".to_string()))?;
    let parsed: SubmitParams = serde_json::from_value(body.clone())
        .map_err(|e| RpcErr::BadParams(format!("invalid submit body: {e}")))?;

    let raw_tx = hex::decode(parsed.signed_tx.trim_start_matches("0x"))
        .map_err(|e| RpcErr::BadParams(format!("signedTx is not valid hex: {e}")))?;

    let source_chain = match parsed.source_chain.as_str() {
        "L1" => SourceChain::L1,
        "L2" => SourceChain::L2,
        other => return Err(RpcErr::BadParams(format!("sourceChain must be L1 or L2, got {other}"))),
    };

    let hints = parsed
        .hints
        .map(|h| SubmitHints {
            l2_addresses: h.l2_addresses,
            l2_target_address: h.l2_target_address,
            is_contract_call: h.is_contract_call,
            known_l1_targets: h.known_l1_targets,
        })
        .unwrap_or_default();

    let request = SubmitRequest {
        raw_tx,
        source_chain,
        hints,
    };

    let engine = ctx.engine.read().await;
    let l1_tx_hash = ctx.submitter.submit(&engine, request).await?;
    Ok(json!({ "l1TxHash": l1_tx_hash }))
}

async fn status(ctx: &BuilderContext) -> Result<Value, RpcErr> {
    let health = *ctx.health.read().await;
    Ok(json!({
        "caughtUp": health.caught_up,
        "lastL1BlockSeen": health.last_l1_block_seen,
        "l2BlockNumber": health.l2_block_number,
    }))
}
