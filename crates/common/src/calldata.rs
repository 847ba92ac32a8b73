//! Minimal Solidity ABI encoder, adapted from the teacher's
//! `ethrex_l2_sdk::calldata` module to this workspace's plain `Vec<u8>`
//! calldata representation. Only the subset of types the genesis
//! contracts and rollup-contract endpoints actually use is implemented:
//! `address`, `uint256`, `bool`, `bytes`, `bytes32` (as `FixedBytes`) and
//! `bytes32[]`/`address[]` arrays.
use crate::hashing::keccak256;
use ethereum_types::{Address, U256};

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes(Vec<u8>),
    FixedBytes([u8; 32]),
    Array(Vec<Value>),
}

/// Encodes `signature` (e.g. `"register(bytes32,bytes)"`) and `values`
/// into selector-prefixed calldata. Panics on a param/value count
/// mismatch: callers only ever invoke this with signatures and argument
/// lists they wrote themselves, so a mismatch is a programming error,
/// not recoverable input.
pub fn encode_calldata(signature: &str, values: &[Value]) -> Vec<u8> {
    let (name, params) = parse_signature(signature);
    assert_eq!(
        params.len(),
        values.len(),
        "encode_calldata: {name} expects {} args, got {}",
        params.len(),
        values.len()
    );

    let mut out = function_selector(&name, &params).to_vec();
    out.extend_from_slice(&encode_tuple(values));
    out
}

fn parse_signature(signature: &str) -> (String, Vec<String>) {
    let sig = signature.trim();
    let (name, rest) = sig.split_once('(').expect("signature missing '('");
    let params = rest.trim_end_matches(')');
    let params: Vec<String> = if params.is_empty() {
        Vec::new()
    } else {
        params.split(',').map(|p| p.trim().to_string()).collect()
    };
    (name.to_string(), params)
}

fn function_selector(name: &str, params: &[String]) -> [u8; 4] {
    let signature = format!("{name}({})", params.join(","));
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

fn is_dynamic(value: &Value) -> bool {
    matches!(value, Value::Bytes(_) | Value::Array(_))
}

fn head_width(value: &Value) -> usize {
    if is_dynamic(value) {
        32
    } else {
        match value {
            Value::Address(_) | Value::Uint(_) | Value::Bool(_) | Value::FixedBytes(_) => 32,
            Value::Bytes(_) | Value::Array(_) => unreachable!(),
        }
    }
}

fn encode_tuple(values: &[Value]) -> Vec<u8> {
    let head_size: usize = values.iter().map(head_width).sum();
    let mut head = vec![0u8; head_size];
    let mut tail = Vec::new();

    for (i, value) in values.iter().enumerate() {
        let slot = i * 32;
        if is_dynamic(value) {
            write_word(&mut head, slot, U256::from(head_size + tail.len()));
            tail.extend_from_slice(&encode_dynamic(value));
        } else {
            write_static(&mut head, slot, value);
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_dynamic(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(bytes) => {
            let mut out = Vec::new();
            let mut len_word = [0u8; 32];
            U256::from(bytes.len()).to_big_endian(&mut len_word);
            out.extend_from_slice(&len_word);
            out.extend_from_slice(bytes);
            let padding = (32 - bytes.len() % 32) % 32;
            out.extend(std::iter::repeat(0u8).take(padding));
            out
        }
        Value::Array(elements) => {
            let mut out = Vec::new();
            let mut len_word = [0u8; 32];
            U256::from(elements.len()).to_big_endian(&mut len_word);
            out.extend_from_slice(&len_word);
            out.extend_from_slice(&encode_tuple(elements));
            out
        }
        _ => unreachable!("encode_dynamic called on a static value"),
    }
}

fn write_static(head: &mut [u8], slot: usize, value: &Value) {
    match value {
        Value::Address(addr) => write_word(head, slot, address_to_word(*addr)),
        Value::Uint(u) => write_word(head, slot, *u),
        Value::Bool(b) => write_word(head, slot, U256::from(u8::from(*b))),
        Value::FixedBytes(bytes) => head[slot..slot + 32].copy_from_slice(bytes),
        Value::Bytes(_) | Value::Array(_) => unreachable!("dynamic value in static slot"),
    }
}

fn write_word(head: &mut [u8], slot: usize, value: U256) {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    head[slot..slot + 32].copy_from_slice(&word);
}

fn address_to_word(address: Address) -> U256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    U256::from_big_endian(&word)
}

/// ABI-encodes constructor arguments for concatenation after creation
/// code, with no function selector prefix.
pub fn encode_constructor_args(values: &[Value]) -> Vec<u8> {
    encode_tuple(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_vector() {
        // transfer(address,uint256) selector is the textbook ERC-20 example.
        let selector = function_selector(
            "transfer",
            &["address".to_string(), "uint256".to_string()],
        );
        assert_eq!(hex::encode(selector), "a9059cbb");
    }

    #[test]
    fn encodes_bytes32_then_dynamic_bytes() {
        let key = [0x11u8; 32];
        let payload = vec![0xaa, 0xbb, 0xcc];
        let calldata = encode_calldata(
            "register(bytes32,bytes)",
            &[Value::FixedBytes(key), Value::Bytes(payload.clone())],
        );
        assert_eq!(&calldata[..4], &function_selector("register", &["bytes32".into(), "bytes".into()])[..]);
        assert_eq!(&calldata[4..36], &key[..]);
        // offset word points past the two static 32-byte head slots.
        let offset = U256::from_big_endian(&calldata[36..68]);
        assert_eq!(offset, U256::from(64));
        let len = U256::from_big_endian(&calldata[68..100]);
        assert_eq!(len, U256::from(3));
        assert_eq!(&calldata[100..103], &payload[..]);
    }

    #[test]
    fn encodes_single_address() {
        let addr = Address::from_low_u64_be(0x42);
        let calldata = encode_calldata("computeSalt(address)", &[Value::Address(addr)]);
        assert_eq!(calldata.len(), 4 + 32);
    }
}
