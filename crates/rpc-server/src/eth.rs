//! The Fullnode's `eth_*` read surface (§6): standard Ethereum JSON-RPC
//! methods answered against the canonical engine's L2 node. Every method
//! here is a pass-through read; none of them touch `DerivationEngine`
//! directly since the engine only mutates through `apply_event`.
use crate::context::FullnodeContext;
use crate::error::RpcErr;
use ethereum_types::{Address, H256};
use rollup_rpc_client::{BlockIdentifier, CallRequest};
use serde_json::{json, Value};

pub async fn map_eth_requests(method: &str, params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    match method {
        "eth_blockNumber" => eth_block_number(ctx).await,
        "eth_getBalance" => eth_get_balance(params, ctx).await,
        "eth_getCode" => eth_get_code(params, ctx).await,
        "eth_getStorageAt" => eth_get_storage_at(params, ctx).await,
        "eth_call" => eth_call(params, ctx).await,
        "eth_getBlockByNumber" => eth_get_block_by_number(params, ctx).await,
        other => Err(RpcErr::MethodNotFound(other.to_string())),
    }
}

fn param(params: &[Value], index: usize) -> Result<&Value, RpcErr> {
    params
        .get(index)
        .ok_or_else(|| RpcErr::BadParams(format!("missing parameter {index}")))
}

fn parse_address(params: &[Value], index: usize) -> Result<Address, RpcErr> {
    serde_json::from_value(param(params, index)?.clone())
        .map_err(|e| RpcErr::BadParams(format!("parameter {index} is not an address: {e}")))
}

fn parse_h256(params: &[Value], index: usize) -> Result<H256, RpcErr> {
    serde_json::from_value(param(params, index)?.clone())
        .map_err(|e| RpcErr::BadParams(format!("parameter {index} is not a 32-byte value: {e}")))
}

fn parse_block(params: &[Value], index: usize) -> Result<BlockIdentifier, RpcErr> {
    let Some(value) = params.get(index).filter(|v| !v.is_null()) else {
        return Ok(BlockIdentifier::Latest);
    };
    match value.as_str() {
        Some("latest") => Ok(BlockIdentifier::Latest),
        Some("pending") => Ok(BlockIdentifier::Pending),
        Some("earliest") => Ok(BlockIdentifier::Earliest),
        Some(hex) => u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map(BlockIdentifier::Number)
            .map_err(|e| RpcErr::BadParams(format!("invalid block tag: {e}"))),
        None => Err(RpcErr::BadParams("block parameter must be a string".to_string())),
    }
}

async fn eth_block_number(ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let number = ctx.engine.read().await.l2_block_number();
    Ok(json!(format!("0x{number:x}")))
}

async fn eth_get_balance(params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let address = parse_address(params, 0)?;
    let block = parse_block(params, 1)?;
    let balance = ctx.l2_client.get_balance(address, block).await?;
    Ok(json!(format!("0x{balance:x}")))
}

async fn eth_get_code(params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let address = parse_address(params, 0)?;
    let block = parse_block(params, 1)?;
    let code = ctx.l2_client.get_code(address, block).await?;
    Ok(json!(format!("0x{}", hex::encode(code))))
}

async fn eth_get_storage_at(params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let address = parse_address(params, 0)?;
    let slot = parse_h256(params, 1)?;
    let block = parse_block(params, 2)?;
    let value = ctx.l2_client.get_storage_at(address, slot, block).await?;
    Ok(json!(value))
}

async fn eth_call(params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let call: CallRequest = serde_json::from_value(param(params, 0)?.clone())
        .map_err(|e| RpcErr::BadParams(format!("invalid call object: {e}")))?;
    let block = parse_block(params, 1)?;
    let result = ctx.l2_client.call(call, block).await?;
    Ok(json!(format!("0x{}", hex::encode(result))))
}

/// Resolves a requested block identifier to the logical L2 block number
/// the engine tracks, never the driver's own (genesis-offset) height.
async fn logical_block_number(requested: BlockIdentifier, ctx: &FullnodeContext) -> u64 {
    match requested {
        BlockIdentifier::Latest | BlockIdentifier::Pending => ctx.engine.read().await.l2_block_number(),
        BlockIdentifier::Earliest => 0,
        BlockIdentifier::Number(n) => n,
    }
}

async fn eth_get_block_by_number(params: &[Value], ctx: &FullnodeContext) -> Result<Value, RpcErr> {
    let requested = parse_block(params, 0)?;
    let logical_number = logical_block_number(requested, ctx).await;
    let anvil_height = ctx.engine.read().await.anvil_block_height(logical_number);

    let block = ctx
        .l2_client
        .get_block_by_number(BlockIdentifier::Number(anvil_height))
        .await?;
    // Report the logical number back to the caller; the driver's own
    // block height runs `GENESIS_BLOCK_COUNT` blocks ahead (§4.1, §8
    // scenario A) and must never leak through this surface.
    let block = block.map(|mut b| {
        b.number = logical_number;
        b
    });
    Ok(serde_json::to_value(block).expect("RpcBlock always serializes"))
}
