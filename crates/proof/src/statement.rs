//! The exact byte preimages a proof is computed over (§4.4 steps 3, §6
//! endpoint parameter lists). Kept separate from the signing scheme so a
//! future proof system can reuse the same statement construction.
use ethereum_types::{Address, H256, U256};
use rollup_common::events::OutgoingCall;
use rollup_common::hashing::{concat, keccak256};

/// `hash(outgoingCalls)`: the ordered list is packed field-by-field and
/// reduced with one keccak256 per call, then the digests are concatenated
/// and hashed again, so the statement changes if any call is reordered,
/// added, or removed.
pub fn hash_outgoing_calls(calls: &[OutgoingCall]) -> H256 {
    let mut preimage = Vec::with_capacity(calls.len() * 32);
    for call in calls {
        let mut gas = [0u8; 32];
        call.gas.to_big_endian(&mut gas);
        let mut value = [0u8; 32];
        call.value.to_big_endian(&mut value);
        let call_hash = keccak256(concat(&[
            call.from.as_bytes(),
            call.target.as_bytes(),
            &value,
            &gas,
            &call.data,
            call.post_call_state_hash.as_bytes(),
        ]));
        preimage.extend_from_slice(call_hash.as_bytes());
    }
    keccak256(preimage)
}

/// `hash(expectedResults)`: same fold-then-hash construction as
/// [`hash_outgoing_calls`], applied to the raw L1 return values.
pub fn hash_results(results: &[Vec<u8>]) -> H256 {
    let mut preimage = Vec::with_capacity(results.len() * 32);
    for result in results {
        preimage.extend_from_slice(keccak256(result).as_bytes());
    }
    keccak256(preimage)
}

/// The statement proved by `process-single-tx` (§4.4 step 3, §6):
/// `(prevL2Root, hash(rlpEncodedTx), postExecutionRoot, hash(outgoingCalls),
/// hash(expectedResults), finalL2Root)`.
pub struct ProcessTxStatement {
    pub prev_l2_root: H256,
    pub rlp_encoded_tx: Vec<u8>,
    pub post_execution_root: H256,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub expected_results: Vec<Vec<u8>>,
    pub final_l2_root: H256,
}

impl ProcessTxStatement {
    pub fn digest(&self) -> H256 {
        let tx_hash = keccak256(&self.rlp_encoded_tx);
        let calls_hash = hash_outgoing_calls(&self.outgoing_calls);
        let results_hash = hash_results(&self.expected_results);
        keccak256(concat(&[
            self.prev_l2_root.as_bytes(),
            tx_hash.as_bytes(),
            self.post_execution_root.as_bytes(),
            calls_hash.as_bytes(),
            results_hash.as_bytes(),
            self.final_l2_root.as_bytes(),
        ]))
    }
}

/// The statement proved by `register-incoming-call` (§4.4 incoming step 3,
/// §6): `(l2Target, prevL2Root, callData, response)`.
pub struct RegisterIncomingCallStatement {
    pub l2_target: Address,
    pub prev_l2_root: H256,
    pub call_data: Vec<u8>,
    pub response: Vec<u8>,
}

impl RegisterIncomingCallStatement {
    pub fn digest(&self) -> H256 {
        keccak256(concat(&[
            self.l2_target.as_bytes(),
            self.prev_l2_root.as_bytes(),
            keccak256(&self.call_data).as_bytes(),
            keccak256(&self.response).as_bytes(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(n: u64) -> OutgoingCall {
        OutgoingCall {
            from: Address::from_low_u64_be(n),
            target: Address::from_low_u64_be(n + 1),
            value: U256::zero(),
            gas: U256::from(21_000),
            data: vec![n as u8],
            post_call_state_hash: H256::zero(),
        }
    }

    #[test]
    fn outgoing_calls_hash_is_order_sensitive() {
        let a = hash_outgoing_calls(&[call(1), call(2)]);
        let b = hash_outgoing_calls(&[call(2), call(1)]);
        assert_ne!(a, b);
    }

    fn statement(final_l2_root: H256) -> ProcessTxStatement {
        ProcessTxStatement {
            prev_l2_root: H256::zero(),
            rlp_encoded_tx: vec![1, 2, 3],
            post_execution_root: H256::repeat_byte(1),
            outgoing_calls: vec![],
            expected_results: vec![],
            final_l2_root,
        }
    }

    #[test]
    fn process_tx_digest_changes_with_final_root() {
        let a = statement(H256::repeat_byte(2));
        let b = statement(H256::repeat_byte(3));
        assert_ne!(a.digest(), b.digest());

        let c = statement(H256::repeat_byte(2));
        assert_eq!(a.digest(), c.digest());
    }
}
