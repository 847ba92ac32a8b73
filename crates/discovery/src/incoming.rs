//! §4.3.2 Cross-chain call discovery for an L1 transaction that may
//! route one or more calls to a known L2→L1 proxy.
use crate::error::DiscoveryError;
use crate::outgoing::{discover_outgoing_calls, OutgoingDiscoveryInput, DEFAULT_MAX_ITERATIONS};
use crate::proxy_trace::collect_matching_calls;
use ethereum_types::{Address, H256, U256};
use rollup_common::events::OutgoingCall;
use rollup_contracts::l2_to_l1_proxy_address;
use rollup_derivation::DerivationEngine;
use rollup_evm::L2ExecutionDriver;
use rollup_rpc_client::{BlockIdentifier, CallRequest, RpcClient};
use std::collections::HashMap;
use tracing::debug;

pub struct IncomingDiscoveryInput {
    pub l1_from: Address,
    pub l1_to: Address,
    pub l1_value: U256,
    pub l1_data: Vec<u8>,
    /// L2 addresses whose L2→L1 proxy on L1 might be this tx's target,
    /// supplied by the submit request's hints (§6 "Builder RPC").
    pub known_l2_addresses: Vec<Address>,
    /// L1 addresses the forwarded call's own execution might call back
    /// out to, seeded into the nested outgoing-call discovery run by
    /// each [`simulate_one`] (§8 scenario E: an L1→L2 call whose inner
    /// L2 execution itself makes an L2→L1 outgoing call).
    pub known_l1_targets: Vec<Address>,
}

/// One predicted `IncomingCallHandled` application, ready to be signed
/// and submitted via the registration pipeline (§4.4).
#[derive(Debug, Clone)]
pub struct DiscoveredIncomingCall {
    pub l2_target: Address,
    pub l1_caller: Address,
    pub call_data: Vec<u8>,
    pub value: U256,
    pub predicted_response: Vec<u8>,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub outgoing_call_results: Vec<Vec<u8>>,
    pub predicted_final_root: H256,
}

/// Runs §4.3.2: traces `input`'s L1 transaction, finds every sub-call
/// routed to a known L2→L1 proxy, and for each predicts the resulting
/// L2 state transition and the response the proxy must hand back to L1.
/// Every simulation happens inside a reverted snapshot of `engine`'s
/// private EVM (§5 "simulations run concurrently... snapshots are cheap
/// and isolated").
pub async fn discover_incoming_calls(
    engine: &DerivationEngine,
    l1_client: &RpcClient,
    rollup_address: Address,
    scratch_timestamp: u64,
    input: IncomingDiscoveryInput,
) -> Result<Vec<DiscoveredIncomingCall>, DiscoveryError> {
    let candidates: HashMap<Address, Address> = input
        .known_l2_addresses
        .iter()
        .map(|&l2_address| (l2_to_l1_proxy_address(rollup_address, l2_address), l2_address))
        .collect();

    let trace = l1_client
        .trace_call(
            CallRequest {
                from: Some(input.l1_from),
                to: Some(input.l1_to),
                value: Some(input.l1_value),
                data: input.l1_data.clone(),
            },
            BlockIdentifier::Latest,
        )
        .await?;

    let matches = collect_matching_calls(&trace, &candidates);
    debug!(count = matches.len(), "found candidate incoming calls in l1 trace");

    let mut discovered = Vec::with_capacity(matches.len());
    for found in matches {
        let l1_caller = found.caller;
        let l2_target = found.counterparty;
        let call_data = found.call_data;
        let value = found.value;

        let snapshot = engine.snapshot().await?;
        let result = simulate_one(
            engine,
            l1_client,
            scratch_timestamp,
            l1_caller,
            l2_target,
            &call_data,
            value,
            &input.known_l1_targets,
        )
        .await;
        engine.revert_to(&snapshot).await?;
        discovered.push(result?);
    }

    Ok(discovered)
}

async fn simulate_one(
    engine: &DerivationEngine,
    l1_client: &RpcClient,
    scratch_timestamp: u64,
    l1_caller: Address,
    l2_target: Address,
    call_data: &[u8],
    value: U256,
    known_l1_targets: &[Address],
) -> Result<DiscoveredIncomingCall, DiscoveryError> {
    let proxy = engine.ensure_l1_to_l2_proxy(l1_caller).await?;

    let mut forwarded = l2_target.as_bytes().to_vec();
    forwarded.extend_from_slice(call_data);

    // Discover any nested L2→L1 outgoing calls the forwarded call itself
    // makes (§8 scenario E) before predicting the proxy's response.
    let system_address = engine.genesis_config().system_address;
    let nested = discover_outgoing_calls(
        engine,
        l1_client,
        scratch_timestamp,
        OutgoingDiscoveryInput {
            from: system_address,
            to: proxy,
            value,
            data: forwarded.clone(),
            known_l1_targets: known_l1_targets.to_vec(),
        },
        DEFAULT_MAX_ITERATIONS,
    )
    .await?;

    // The registrations `discover_outgoing_calls` found were reverted along
    // with its internal snapshot; re-apply them for real before anything
    // that consults the registry, or both the readonly probe below and the
    // real forwarded call will find it empty and revert (§8 scenario E).
    engine
        .register_outgoing_calls(&nested.outgoing_calls, &nested.outgoing_call_results)
        .await?;

    let predicted_response = engine
        .driver()
        .call_readonly(system_address, proxy, value, forwarded.clone())
        .await?;

    engine
        .driver()
        .send_privileged(system_address, Some(proxy), value, forwarded)
        .await?;
    engine.driver().mine_block(scratch_timestamp).await?;
    let predicted_final_root = engine.current_state_root().await?;

    Ok(DiscoveredIncomingCall {
        l2_target,
        l1_caller,
        call_data: call_data.to_vec(),
        value,
        predicted_response,
        outgoing_calls: nested.outgoing_calls,
        outgoing_call_results: nested.outgoing_call_results,
        predicted_final_root,
    })
}
