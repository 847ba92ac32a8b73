//! Topic0 selectors for the four events the L1 rollup contract emits
//! (§6). Computed from the canonical Solidity event signatures rather
//! than hardcoded, so a signature typo here fails loudly instead of
//! silently never matching a log.
use rollup_common::keccak256;
use ethereum_types::H256;
use std::sync::LazyLock;

const L2_BLOCK_PROCESSED_SIG: &str =
    "L2BlockProcessed(uint256,bytes32,bytes32,bytes,(address,address,uint256,uint256,bytes,bytes32)[],bytes[])";

const INCOMING_CALL_HANDLED_SIG: &str = "IncomingCallHandled(address,address,bytes32,bytes,uint256,(address,address,uint256,uint256,bytes,bytes32)[],bytes[],bytes32)";

const INCOMING_CALL_REGISTERED_SIG: &str = "IncomingCallRegistered(address,bytes32,bytes32)";

const L2_SENDER_PROXY_DEPLOYED_SIG: &str = "L2SenderProxyDeployed(address,address)";

pub static L2_BLOCK_PROCESSED: LazyLock<H256> =
    LazyLock::new(|| keccak256(L2_BLOCK_PROCESSED_SIG.as_bytes()));

pub static INCOMING_CALL_HANDLED: LazyLock<H256> =
    LazyLock::new(|| keccak256(INCOMING_CALL_HANDLED_SIG.as_bytes()));

pub static INCOMING_CALL_REGISTERED: LazyLock<H256> =
    LazyLock::new(|| keccak256(INCOMING_CALL_REGISTERED_SIG.as_bytes()));

pub static L2_SENDER_PROXY_DEPLOYED: LazyLock<H256> =
    LazyLock::new(|| keccak256(L2_SENDER_PROXY_DEPLOYED_SIG.as_bytes()));

/// Topics of the two state-changing events the initial catch-up and the
/// live poller filter on (§4.2: "fetch all events of the two
/// state-changing kinds").
pub fn state_changing_topics() -> Vec<H256> {
    vec![*L2_BLOCK_PROCESSED, *INCOMING_CALL_HANDLED]
}

/// All four topics, used by consumers that also want the informational
/// events for observability (§3).
pub fn all_topics() -> Vec<H256> {
    vec![
        *L2_BLOCK_PROCESSED,
        *INCOMING_CALL_HANDLED,
        *INCOMING_CALL_REGISTERED,
        *L2_SENDER_PROXY_DEPLOYED,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_distinct() {
        let topics = all_topics();
        for (i, a) in topics.iter().enumerate() {
            for (j, b) in topics.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
