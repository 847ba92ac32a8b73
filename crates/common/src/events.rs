use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// One `(from, target, value, gas, data)` L2→L1 call plus the state root the
/// rollup claims resulted from committing its registration, as emitted
/// inside both state-changing events (§3, §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingCall {
    pub from: Address,
    pub target: Address,
    pub value: U256,
    pub gas: U256,
    pub data: Vec<u8>,
    pub post_call_state_hash: H256,
}

/// Body of `L2BlockProcessed` (§3, §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2BlockProcessed {
    pub l2_block_number: u64,
    pub prev_l2_root: H256,
    pub new_l2_root: H256,
    pub rlp_encoded_tx: Vec<u8>,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub outgoing_call_results: Vec<Vec<u8>>,
}

/// Body of `IncomingCallHandled` (§3, §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallHandled {
    pub l2_target: Address,
    pub l1_caller: Address,
    pub prev_l2_root: H256,
    pub call_data: Vec<u8>,
    pub value: U256,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub outgoing_call_results: Vec<Vec<u8>>,
    pub final_state_hash: H256,
}

/// `IncomingCallRegistered`, informational only (§3): MUST NOT affect
/// derived state, kept for observability/metadata consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallRegistered {
    pub l2_target: Address,
    pub prev_l2_root: H256,
    pub call_data_hash: H256,
}

/// `L2SenderProxyDeployed`, informational only (§3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2SenderProxyDeployed {
    pub l2_address: Address,
    pub proxy_address: Address,
}

/// The four event kinds the L1 rollup contract emits. Only the first two
/// are state-changing; the engine applies them and MUST ignore the rest
/// when deriving state (§3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum L1EventBody {
    L2BlockProcessed(L2BlockProcessed),
    IncomingCallHandled(IncomingCallHandled),
    IncomingCallRegistered(IncomingCallRegistered),
    L2SenderProxyDeployed(L2SenderProxyDeployed),
}

impl L1EventBody {
    /// Whether applying this event can change derived L2 state (§3).
    pub fn is_state_changing(&self) -> bool {
        matches!(
            self,
            L1EventBody::L2BlockProcessed(_) | L1EventBody::IncomingCallHandled(_)
        )
    }

    pub fn prev_l2_root(&self) -> Option<H256> {
        match self {
            L1EventBody::L2BlockProcessed(e) => Some(e.prev_l2_root),
            L1EventBody::IncomingCallHandled(e) => Some(e.prev_l2_root),
            _ => None,
        }
    }

    /// The state root the engine must reach after applying this event, if
    /// it is state-changing (§4.1 step 4).
    pub fn claimed_final_root(&self) -> Option<H256> {
        match self {
            L1EventBody::L2BlockProcessed(e) => Some(e.new_l2_root),
            L1EventBody::IncomingCallHandled(e) => Some(e.final_state_hash),
            _ => None,
        }
    }
}

/// Total order key: L1 block number then log index within the block
/// (§4.1 "Ordering guarantee", §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventOrderKey {
    pub l1_block_number: u64,
    pub log_index: u64,
}

/// Dedupe key for the event source's processed-set (§4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDedupeKey {
    pub tx_hash: H256,
    pub log_index: u64,
}

/// A decoded L1 event together with the ordering/dedupe metadata attached
/// when it was fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Event {
    pub order: EventOrderKey,
    pub dedupe: EventDedupeKey,
    /// Timestamp of the containing L1 block. Per §4.1.3/§9 this is the
    /// *only* legal source of the derived L2 block's timestamp.
    pub l1_block_timestamp: u64,
    pub body: L1EventBody,
}

impl Ord for L1Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order.cmp(&other.order)
    }
}

impl PartialOrd for L1Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_order_key_sorts_by_block_then_log_index() {
        let mut keys = vec![
            EventOrderKey { l1_block_number: 5, log_index: 1 },
            EventOrderKey { l1_block_number: 5, log_index: 0 },
            EventOrderKey { l1_block_number: 4, log_index: 9 },
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                EventOrderKey { l1_block_number: 4, log_index: 9 },
                EventOrderKey { l1_block_number: 5, log_index: 0 },
                EventOrderKey { l1_block_number: 5, log_index: 1 },
            ]
        );
    }

    #[test]
    fn informational_events_never_claim_a_final_root() {
        let body = L1EventBody::L2SenderProxyDeployed(L2SenderProxyDeployed {
            l2_address: Address::zero(),
            proxy_address: Address::zero(),
        });
        assert!(!body.is_state_changing());
        assert_eq!(body.claimed_final_root(), None);
    }
}
