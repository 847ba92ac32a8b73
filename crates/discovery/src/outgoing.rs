//! §4.3.1 Cross-chain call discovery for an L2 transaction that may make
//! L2→L1 outgoing calls.
use crate::error::DiscoveryError;
use crate::proxy_trace::find_unresolved_call;
use ethereum_types::{Address, H256, U256};
use rollup_common::events::OutgoingCall;
use rollup_contracts::l1_to_l2_proxy_address;
use rollup_derivation::DerivationEngine;
use rollup_evm::L2ExecutionDriver;
use rollup_rpc_client::{BlockIdentifier, CallRequest, RpcClient};
use std::collections::HashMap;
use tracing::debug;

/// Bounds the fixed-point loop (§4.3.3); a discovery stuck past this
/// many iterations is almost certainly a bug rather than a legitimately
/// deep call chain.
pub const DEFAULT_MAX_ITERATIONS: u32 = 32;

/// One L2 transaction to run discovery over, plus the L1 addresses it
/// might call out to. The caller supplies `known_l1_targets` because the
/// Call Registry's proxies cannot be enumerated from outside; the
/// Builder populates this from the submit request's hints and from its
/// own record of previously observed `L2SenderProxyDeployed`/proxy-deploy
/// activity.
pub struct OutgoingDiscoveryInput {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub known_l1_targets: Vec<Address>,
}

#[derive(Debug, Clone)]
pub struct OutgoingDiscoveryResult {
    pub outgoing_calls: Vec<OutgoingCall>,
    pub outgoing_call_results: Vec<Vec<u8>>,
    pub final_state_root: H256,
}

/// Runs the iterative discovery algorithm of §4.3.1 inside a reverted
/// snapshot of `engine`'s private EVM, so callers never see the
/// intermediate scratch blocks this loop mines to make each
/// registration visible to the next trace.
pub async fn discover_outgoing_calls(
    engine: &DerivationEngine,
    l1_client: &RpcClient,
    scratch_timestamp: u64,
    input: OutgoingDiscoveryInput,
    max_iterations: u32,
) -> Result<OutgoingDiscoveryResult, DiscoveryError> {
    let addresses = engine.genesis_addresses();
    let system_address = engine.genesis_config().system_address;

    let candidates: HashMap<Address, Address> = input
        .known_l1_targets
        .iter()
        .map(|&l1_target| {
            let proxy = l1_to_l2_proxy_address(
                addresses.proxy_factory,
                system_address,
                l1_target,
                addresses.call_registry,
            );
            (proxy, l1_target)
        })
        .collect();

    let snapshot = engine.snapshot().await?;
    let result = run_discovery_loop(
        engine,
        l1_client,
        scratch_timestamp,
        &input,
        &candidates,
        max_iterations,
    )
    .await;
    engine.revert_to(&snapshot).await?;
    result
}

async fn run_discovery_loop(
    engine: &DerivationEngine,
    l1_client: &RpcClient,
    scratch_timestamp: u64,
    input: &OutgoingDiscoveryInput,
    candidates: &HashMap<Address, Address>,
    max_iterations: u32,
) -> Result<OutgoingDiscoveryResult, DiscoveryError> {
    let mut outgoing_calls = Vec::new();
    let mut outgoing_call_results = Vec::new();

    for iteration in 0..max_iterations {
        let trace = engine
            .driver()
            .trace_call(input.from, input.to, input.value, input.data.clone())
            .await?;

        let Some(unresolved) = find_unresolved_call(&trace, candidates) else {
            debug!(iteration, "outgoing call discovery converged");
            let final_state_root = engine.current_state_root().await?;
            return Ok(OutgoingDiscoveryResult {
                outgoing_calls,
                outgoing_call_results,
                final_state_root,
            });
        };

        debug!(
            iteration,
            l1_target = ?unresolved.counterparty,
            l2_caller = ?unresolved.caller,
            "resolving unregistered outgoing call"
        );

        let l1_response = l1_client
            .call(
                CallRequest {
                    from: None,
                    to: Some(unresolved.counterparty),
                    value: Some(unresolved.value),
                    data: unresolved.call_data.clone(),
                },
                BlockIdentifier::Latest,
            )
            .await?;

        let call = OutgoingCall {
            from: unresolved.caller,
            target: unresolved.counterparty,
            value: unresolved.value,
            gas: U256::zero(),
            data: unresolved.call_data.clone(),
            post_call_state_hash: H256::zero(),
        };
        engine
            .register_outgoing_calls(std::slice::from_ref(&call), std::slice::from_ref(&l1_response))
            .await?;
        engine.driver().mine_block(scratch_timestamp).await?;

        outgoing_calls.push(call);
        outgoing_call_results.push(l1_response);
    }

    Err(DiscoveryError::NoFixedPoint {
        iterations: max_iterations,
    })
}
