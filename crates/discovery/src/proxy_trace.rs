//! Shared call-tree walking for both discovery modes (§4.3.3): given a
//! traced call and a set of candidate proxy addresses the caller cares
//! about, find the first sub-call that reverted trying to consult the
//! Call Registry through one of them.
use ethereum_types::{Address, U256};
use rollup_rpc_client::CallFrame;
use std::collections::HashMap;

/// One unresolved cross-chain call surfaced by a trace (§4.3.1 step 2a,
/// §4.3.2 step 1).
#[derive(Debug, Clone)]
pub struct UnresolvedCall {
    /// The proxy address the failing sub-call targeted.
    pub proxy_address: Address,
    /// The L1/L2 peer address `proxy_address` represents, resolved via
    /// the caller's candidate map.
    pub counterparty: Address,
    pub caller: Address,
    pub call_data: Vec<u8>,
    pub value: U256,
}

/// Depth-first search for the first failing call whose target is a key
/// of `candidates`. A failing call deeper in the tree is preferred over
/// a failing ancestor, since the ancestor's failure is usually just
/// "a sub-call reverted" bubbling up, not itself an unresolved lookup.
pub fn find_unresolved_call(
    frame: &CallFrame,
    candidates: &HashMap<Address, Address>,
) -> Option<UnresolvedCall> {
    for child in &frame.calls {
        if let Some(found) = find_unresolved_call(child, candidates) {
            return Some(found);
        }
    }

    if frame.error.is_some() {
        if let Some(to) = frame.to {
            if let Some(&counterparty) = candidates.get(&to) {
                return Some(UnresolvedCall {
                    proxy_address: to,
                    counterparty,
                    caller: frame.from,
                    call_data: frame.input.clone(),
                    value: frame.value.unwrap_or_default(),
                });
            }
        }
    }

    None
}

/// Collects every sub-call whose target matches a candidate, in the
/// order the tracer visited them, regardless of whether that call
/// succeeded. Used by incoming-call discovery (§4.3.2 step 1), which is
/// scanning for calls routed to a known L2→L1 proxy rather than for a
/// failure signal.
pub fn collect_matching_calls(
    frame: &CallFrame,
    candidates: &HashMap<Address, Address>,
) -> Vec<UnresolvedCall> {
    let mut found = Vec::new();
    collect_matching_calls_into(frame, candidates, &mut found);
    found
}

fn collect_matching_calls_into(
    frame: &CallFrame,
    candidates: &HashMap<Address, Address>,
    out: &mut Vec<UnresolvedCall>,
) {
    if let Some(to) = frame.to {
        if let Some(&counterparty) = candidates.get(&to) {
            out.push(UnresolvedCall {
                proxy_address: to,
                counterparty,
                caller: frame.from,
                call_data: frame.input.clone(),
                value: frame.value.unwrap_or_default(),
            });
        }
    }
    for child in &frame.calls {
        collect_matching_calls_into(child, candidates, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(to: Option<Address>, error: Option<&str>, calls: Vec<CallFrame>) -> CallFrame {
        CallFrame {
            kind: "CALL".to_string(),
            from: Address::from_low_u64_be(1),
            to,
            input: vec![0xde, 0xad],
            output: Vec::new(),
            value: Some(U256::zero()),
            error: error.map(str::to_string),
            calls,
        }
    }

    #[test]
    fn finds_nothing_when_everything_succeeds() {
        let proxy = Address::from_low_u64_be(9);
        let mut candidates = HashMap::new();
        candidates.insert(proxy, Address::from_low_u64_be(100));

        let root = frame(Some(proxy), None, vec![]);
        assert!(find_unresolved_call(&root, &candidates).is_none());
    }

    #[test]
    fn finds_a_failing_call_to_a_candidate_proxy() {
        let proxy = Address::from_low_u64_be(9);
        let l1_target = Address::from_low_u64_be(100);
        let mut candidates = HashMap::new();
        candidates.insert(proxy, l1_target);

        let leaf = frame(Some(proxy), Some("execution reverted"), vec![]);
        let root = frame(Some(Address::from_low_u64_be(2)), Some("execution reverted"), vec![leaf]);

        let found = find_unresolved_call(&root, &candidates).unwrap();
        assert_eq!(found.proxy_address, proxy);
        assert_eq!(found.counterparty, l1_target);
    }

    #[test]
    fn ignores_failing_calls_to_unknown_addresses() {
        let candidates = HashMap::new();
        let root = frame(Some(Address::from_low_u64_be(2)), Some("reverted"), vec![]);
        assert!(find_unresolved_call(&root, &candidates).is_none());
    }

    #[test]
    fn collects_every_matching_call_regardless_of_error() {
        let proxy_a = Address::from_low_u64_be(9);
        let proxy_b = Address::from_low_u64_be(10);
        let mut candidates = HashMap::new();
        candidates.insert(proxy_a, Address::from_low_u64_be(100));
        candidates.insert(proxy_b, Address::from_low_u64_be(200));

        let leaf_a = frame(Some(proxy_a), None, vec![]);
        let leaf_b = frame(Some(proxy_b), None, vec![]);
        let root = frame(Some(Address::from_low_u64_be(2)), None, vec![leaf_a, leaf_b]);

        let found = collect_matching_calls(&root, &candidates);
        assert_eq!(found.len(), 2);
    }
}
