//! Hand-rolled ABI decoding of the four L1 event log bodies (§6). All
//! event parameters are non-indexed, so each log's `data` is exactly one
//! ABI-encoded tuple; decoding is plain byte-offset arithmetic over that
//! tuple, the same style as an upstream messenger log decoder that reads
//! fixed words out of `log.data` rather than pulling in a generic ABI
//! crate.
use crate::selectors;
use ethereum_types::{Address, H256, U256};
use rollup_common::events::{
    IncomingCallHandled, IncomingCallRegistered, L1EventBody, L2BlockProcessed,
    L2SenderProxyDeployed, OutgoingCall,
};
use rollup_rpc_client::types::RpcLog;

const WORD: usize = 32;

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], String> {
    data.get(offset..offset + WORD)
        .ok_or_else(|| format!("truncated log data: expected word at byte {offset}"))
}

fn u256_at(data: &[u8], offset: usize) -> Result<U256, String> {
    Ok(U256::from_big_endian(word_at(data, offset)?))
}

fn usize_at(data: &[u8], offset: usize) -> Result<usize, String> {
    Ok(u256_at(data, offset)?.as_usize())
}

fn address_at(data: &[u8], offset: usize) -> Result<Address, String> {
    Ok(Address::from_slice(&word_at(data, offset)?[12..32]))
}

fn h256_at(data: &[u8], offset: usize) -> Result<H256, String> {
    Ok(H256::from_slice(word_at(data, offset)?))
}

/// Reads a dynamic `bytes` value whose length-prefixed encoding starts
/// at `offset` (i.e. `offset` points directly at the length word).
fn bytes_at(data: &[u8], offset: usize) -> Result<Vec<u8>, String> {
    let len = usize_at(data, offset)?;
    data.get(offset + WORD..offset + WORD + len)
        .map(|s| s.to_vec())
        .ok_or_else(|| format!("truncated bytes value at byte {offset}, len {len}"))
}

/// Reads one `OutgoingCall` tuple whose head starts at `tuple_base`
/// (§6: `(address from, address target, uint256 value, uint256 gas,
/// bytes data, bytes32 postCallStateHash)`).
fn outgoing_call_at(data: &[u8], tuple_base: usize) -> Result<OutgoingCall, String> {
    let from = address_at(data, tuple_base)?;
    let target = address_at(data, tuple_base + WORD)?;
    let value = u256_at(data, tuple_base + 2 * WORD)?;
    let gas = u256_at(data, tuple_base + 3 * WORD)?;
    let data_rel_offset = usize_at(data, tuple_base + 4 * WORD)?;
    let call_data = bytes_at(data, tuple_base + data_rel_offset)?;
    let post_call_state_hash = h256_at(data, tuple_base + 5 * WORD)?;
    Ok(OutgoingCall {
        from,
        target,
        value,
        gas,
        data: call_data,
        post_call_state_hash,
    })
}

/// Reads a dynamic array whose head word (at `head_offset`) holds the
/// byte offset, relative to the start of `data`, of the array's length
/// word. `elem_reader` is handed the absolute offset of each element
/// (its own head, for tuples; its length word, for nested `bytes`).
fn dynamic_array_at<T>(
    data: &[u8],
    head_offset: usize,
    elem_reader: impl Fn(&[u8], usize) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    let array_base = usize_at(data, head_offset)?;
    let len = usize_at(data, array_base)?;
    let elements_start = array_base + WORD;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let elem_rel = usize_at(data, elements_start + i * WORD)?;
        out.push(elem_reader(data, elements_start + elem_rel)?);
    }
    Ok(out)
}

fn outgoing_calls_at(data: &[u8], head_offset: usize) -> Result<Vec<OutgoingCall>, String> {
    dynamic_array_at(data, head_offset, outgoing_call_at)
}

fn bytes_array_at(data: &[u8], head_offset: usize) -> Result<Vec<Vec<u8>>, String> {
    dynamic_array_at(data, head_offset, bytes_at)
}

fn decode_l2_block_processed(data: &[u8]) -> Result<L2BlockProcessed, String> {
    let l2_block_number = u256_at(data, 0)?.as_u64();
    let prev_l2_root = h256_at(data, WORD)?;
    let new_l2_root = h256_at(data, 2 * WORD)?;
    let rlp_encoded_tx = bytes_at(data, usize_at(data, 3 * WORD)?)?;
    let outgoing_calls = outgoing_calls_at(data, 4 * WORD)?;
    let outgoing_call_results = bytes_array_at(data, 5 * WORD)?;
    Ok(L2BlockProcessed {
        l2_block_number,
        prev_l2_root,
        new_l2_root,
        rlp_encoded_tx,
        outgoing_calls,
        outgoing_call_results,
    })
}

fn decode_incoming_call_handled(data: &[u8]) -> Result<IncomingCallHandled, String> {
    let l2_target = address_at(data, 0)?;
    let l1_caller = address_at(data, WORD)?;
    let prev_l2_root = h256_at(data, 2 * WORD)?;
    let call_data = bytes_at(data, usize_at(data, 3 * WORD)?)?;
    let value = u256_at(data, 4 * WORD)?;
    let outgoing_calls = outgoing_calls_at(data, 5 * WORD)?;
    let outgoing_call_results = bytes_array_at(data, 6 * WORD)?;
    let final_state_hash = h256_at(data, 7 * WORD)?;
    Ok(IncomingCallHandled {
        l2_target,
        l1_caller,
        prev_l2_root,
        call_data,
        value,
        outgoing_calls,
        outgoing_call_results,
        final_state_hash,
    })
}

fn decode_incoming_call_registered(data: &[u8]) -> Result<IncomingCallRegistered, String> {
    Ok(IncomingCallRegistered {
        l2_target: address_at(data, 0)?,
        prev_l2_root: h256_at(data, WORD)?,
        call_data_hash: h256_at(data, 2 * WORD)?,
    })
}

fn decode_l2_sender_proxy_deployed(data: &[u8]) -> Result<L2SenderProxyDeployed, String> {
    Ok(L2SenderProxyDeployed {
        l2_address: address_at(data, 0)?,
        proxy_address: address_at(data, WORD)?,
    })
}

/// Decodes `log` into its `L1EventBody`, dispatching on `log.topics[0]`.
/// Returns `Ok(None)` for a log whose topic0 matches none of the four
/// known events (the caller's address filter should prevent this, but a
/// stray log is not an error worth failing catch-up over).
pub fn decode_log(log: &RpcLog) -> Result<Option<L1EventBody>, String> {
    let Some(&topic0) = log.topics.first() else {
        return Ok(None);
    };
    let data = &log.data;

    if topic0 == *selectors::L2_BLOCK_PROCESSED {
        Ok(Some(L1EventBody::L2BlockProcessed(decode_l2_block_processed(data)?)))
    } else if topic0 == *selectors::INCOMING_CALL_HANDLED {
        Ok(Some(L1EventBody::IncomingCallHandled(decode_incoming_call_handled(data)?)))
    } else if topic0 == *selectors::INCOMING_CALL_REGISTERED {
        Ok(Some(L1EventBody::IncomingCallRegistered(decode_incoming_call_registered(data)?)))
    } else if topic0 == *selectors::L2_SENDER_PROXY_DEPLOYED {
        Ok(Some(L1EventBody::L2SenderProxyDeployed(decode_l2_sender_proxy_deployed(data)?)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u64) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&n.to_be_bytes());
        w
    }

    #[test]
    fn decodes_incoming_call_registered_all_static() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(Address::from_low_u64_be(7).as_bytes());
        data.extend_from_slice(H256::repeat_byte(1).as_bytes());
        data.extend_from_slice(H256::repeat_byte(2).as_bytes());

        let decoded = decode_incoming_call_registered(&data).unwrap();
        assert_eq!(decoded.l2_target, Address::from_low_u64_be(7));
        assert_eq!(decoded.prev_l2_root, H256::repeat_byte(1));
        assert_eq!(decoded.call_data_hash, H256::repeat_byte(2));
    }

    #[test]
    fn decodes_l2_block_processed_with_empty_dynamic_fields() {
        // head: blockNumber, prevRoot, newRoot, off(tx)=4*32, off(calls)=5*32, off(results)
        // tail: tx(empty bytes: len=0), calls(empty array: len=0), results(empty array: len=0)
        let mut data = Vec::new();
        data.extend_from_slice(&word(9));
        data.extend_from_slice(H256::repeat_byte(0xA).as_bytes());
        data.extend_from_slice(H256::repeat_byte(0xB).as_bytes());
        data.extend_from_slice(&word(6 * 32)); // tx bytes start
        data.extend_from_slice(&word(7 * 32)); // calls array start
        data.extend_from_slice(&word(8 * 32)); // results array start
        data.extend_from_slice(&word(0)); // tx len = 0
        data.extend_from_slice(&word(0)); // calls len = 0
        data.extend_from_slice(&word(0)); // results len = 0

        let decoded = decode_l2_block_processed(&data).unwrap();
        assert_eq!(decoded.l2_block_number, 9);
        assert_eq!(decoded.prev_l2_root, H256::repeat_byte(0xA));
        assert_eq!(decoded.new_l2_root, H256::repeat_byte(0xB));
        assert!(decoded.rlp_encoded_tx.is_empty());
        assert!(decoded.outgoing_calls.is_empty());
        assert!(decoded.outgoing_call_results.is_empty());
    }

    #[test]
    fn decodes_bytes_array_with_one_entry() {
        // array head at offset 0 points to 32 (right after the head word).
        let mut data = Vec::new();
        data.extend_from_slice(&word(32)); // head -> array starts at byte 32
        data.extend_from_slice(&word(1)); // array length = 1
        data.extend_from_slice(&word(32)); // element head: rel offset from elements_start (64) -> elem at 64+32=96
        data.extend_from_slice(&word(1)); // elem0 bytes length = 1
        let mut padded = vec![0x2au8];
        padded.extend(std::iter::repeat(0u8).take(31));
        data.extend_from_slice(&padded);

        let decoded = bytes_array_at(&data, 0).unwrap();
        assert_eq!(decoded, vec![vec![0x2a]]);
    }
}
