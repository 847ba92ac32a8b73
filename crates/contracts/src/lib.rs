//! Creation bytecode and calldata/address helpers for the two genesis
//! contracts (Call Registry `R`, Proxy Factory `F`) and the two proxy
//! templates they deploy (§3, §4.6). The bytecode itself is compiled at
//! build time by `build.rs`; this module only ever deals with bytes and
//! addresses, never an EVM.

use rollup_common::calldata::{encode_calldata, encode_constructor_args, Value};
use rollup_common::primitives::{contract_creation_address, create2_address};
use rollup_common::{keccak256, Address, H256};

/// Creation bytecode for the Call Registry, with no constructor args baked
/// in yet (`owner` is appended by [`call_registry_init_code`]).
pub const CALL_REGISTRY_CODE: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/solc_out/CallRegistry.bytecode"));

pub const PROXY_FACTORY_CODE: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/solc_out/ProxyFactory.bytecode"));

pub const L1_TO_L2_PROXY_CODE: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/solc_out/L1ToL2Proxy.bytecode"));

pub const L2_TO_L1_PROXY_CODE: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/solc_out/L2ToL1Proxy.bytecode"));

/// Domain-separating salt prefix mixed into every L1→L2 proxy's CREATE2
/// salt (§4.6), matching `ProxyFactory.SALT_PREFIX` in the Solidity
/// source verbatim (`keccak256("rollup.l1-to-l2-proxy.v1")`).
pub fn salt_prefix() -> H256 {
    keccak256(b"rollup.l1-to-l2-proxy.v1")
}

/// Full creation code (code ‖ constructor args) for the Call Registry,
/// deployed once at genesis by the System Address.
pub fn call_registry_init_code(owner: Address) -> Vec<u8> {
    let mut code = CALL_REGISTRY_CODE.to_vec();
    code.extend(encode_constructor_args(&[Value::Address(owner)]));
    code
}

/// Full creation code for the Proxy Factory, deployed once at genesis
/// right after the Call Registry.
pub fn proxy_factory_init_code(owner: Address, registry: Address) -> Vec<u8> {
    let mut code = PROXY_FACTORY_CODE.to_vec();
    code.extend(encode_constructor_args(&[
        Value::Address(owner),
        Value::Address(registry),
    ]));
    code
}

/// Full creation code for one L1→L2 proxy instance.
pub fn l1_to_l2_proxy_init_code(owner: Address, l1_caller: Address, registry: Address) -> Vec<u8> {
    let mut code = L1_TO_L2_PROXY_CODE.to_vec();
    code.extend(encode_constructor_args(&[
        Value::Address(owner),
        Value::Address(l1_caller),
        Value::Address(registry),
    ]));
    code
}

/// Full creation code for one L2→L1 proxy instance.
pub fn l2_to_l1_proxy_init_code(rollup: Address, l2_address: Address) -> Vec<u8> {
    let mut code = L2_TO_L1_PROXY_CODE.to_vec();
    code.extend(encode_constructor_args(&[
        Value::Address(rollup),
        Value::Address(l2_address),
    ]));
    code
}

/// The Call Registry's address is deterministic only through the System
/// Address's fixed genesis nonce (§3: "deployed at fixed, spec-defined
/// nonces"), so the caller supplies that nonce rather than this module
/// hardcoding it.
pub fn call_registry_address(system_address: Address, nonce: u64) -> Address {
    contract_creation_address(system_address, nonce)
}

pub fn proxy_factory_address(system_address: Address, nonce: u64) -> Address {
    contract_creation_address(system_address, nonce)
}

/// Computes the salt `ProxyFactory.computeSalt` would return for
/// `l1_caller`, without making an RPC call.
pub fn l1_to_l2_proxy_salt(l1_caller: Address) -> H256 {
    let mut preimage = salt_prefix().as_bytes().to_vec();
    preimage.extend_from_slice(l1_caller.as_bytes());
    keccak256(preimage)
}

/// Predicts the CREATE2 address `ProxyFactory.deployProxy(l1Caller)` will
/// produce, so the derivation engine can check `proxy.code.length` before
/// ever sending the deploying transaction (§4.1.2 step 2).
pub fn l1_to_l2_proxy_address(
    factory: Address,
    owner: Address,
    l1_caller: Address,
    registry: Address,
) -> Address {
    let init_code = l1_to_l2_proxy_init_code(owner, l1_caller, registry);
    let init_code_hash = keccak256(&init_code);
    create2_address(factory, l1_to_l2_proxy_salt(l1_caller), init_code_hash)
}

/// Predicts the address an L2→L1 proxy would be deployed at by `rollup`
/// using the same CREATE2 convention, mirroring `l1_to_l2_proxy_address`
/// for the opposite direction (§4.6). `rollup` is the external L1 rollup
/// contract (out of scope here, §1), treated as an opaque CREATE2
/// deployer.
pub fn l2_to_l1_proxy_address(rollup: Address, l2_address: Address) -> Address {
    let init_code = l2_to_l1_proxy_init_code(rollup, l2_address);
    let init_code_hash = keccak256(&init_code);
    let mut salt_preimage = salt_prefix().as_bytes().to_vec();
    salt_preimage.extend_from_slice(l2_address.as_bytes());
    create2_address(rollup, keccak256(salt_preimage), init_code_hash)
}

/// `CallRegistry.register(bytes32,bytes)` calldata.
pub fn encode_register(key: H256, value: &[u8]) -> Vec<u8> {
    encode_calldata(
        "register(bytes32,bytes)",
        &[
            Value::FixedBytes(key.0),
            Value::Bytes(value.to_vec()),
        ],
    )
}

/// `CallRegistry.consume(bytes32)` calldata.
pub fn encode_consume(key: H256) -> Vec<u8> {
    encode_calldata("consume(bytes32)", &[Value::FixedBytes(key.0)])
}

/// `CallRegistry.clear(bytes32[])` calldata, used by the optional expiry
/// sweep (§4.4.1).
pub fn encode_clear(keys: &[H256]) -> Vec<u8> {
    let values = keys.iter().map(|k| Value::FixedBytes(k.0)).collect();
    encode_calldata("clear(bytes32[])", &[Value::Array(values)])
}

/// `CallRegistry.pending(bytes32)` calldata.
pub fn encode_pending(key: H256) -> Vec<u8> {
    encode_calldata("pending(bytes32)", &[Value::FixedBytes(key.0)])
}

/// `ProxyFactory.deployProxy(address)` calldata.
pub fn encode_deploy_proxy(l1_caller: Address) -> Vec<u8> {
    encode_calldata("deployProxy(address)", &[Value::Address(l1_caller)])
}

/// `ProxyFactory.computeSalt(address)` calldata, mostly useful for
/// cross-checking [`l1_to_l2_proxy_salt`] against the live contract in
/// integration tests.
pub fn encode_compute_salt(l1_caller: Address) -> Vec<u8> {
    encode_calldata("computeSalt(address)", &[Value::Address(l1_caller)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_address_is_stable_across_calls() {
        let factory = Address::from_low_u64_be(1);
        let owner = Address::from_low_u64_be(2);
        let l1_caller = Address::from_low_u64_be(3);
        let registry = Address::from_low_u64_be(4);

        let a = l1_to_l2_proxy_address(factory, owner, l1_caller, registry);
        let b = l1_to_l2_proxy_address(factory, owner, l1_caller, registry);
        assert_eq!(a, b);
    }

    #[test]
    fn different_l1_callers_get_different_proxy_addresses() {
        let factory = Address::from_low_u64_be(1);
        let owner = Address::from_low_u64_be(2);
        let registry = Address::from_low_u64_be(4);

        let a = l1_to_l2_proxy_address(factory, owner, Address::from_low_u64_be(10), registry);
        let b = l1_to_l2_proxy_address(factory, owner, Address::from_low_u64_be(11), registry);
        assert_ne!(a, b);
    }

    #[test]
    fn register_calldata_starts_with_function_selector() {
        let key = H256::zero();
        let calldata = encode_register(key, b"hello");
        // register(bytes32,bytes) selector, computed independently here to
        // catch any accidental signature drift from the Solidity source.
        let expected_selector = keccak256(b"register(bytes32,bytes)".as_slice());
        assert_eq!(&calldata[..4], &expected_selector.as_bytes()[..4]);
    }
}
