//! §6 "L1 rollup contract — endpoints invoked by the Builder (abstract)".
//! The rollup contract itself is an external collaborator (§1); this
//! module only defines the capability the Builder needs from it
//! (`RollupEndpoint`) and one concrete binding that ABI-encodes calldata
//! and broadcasts a signed L1 transaction through [`RpcClient`], the same
//! "variant point, one concrete impl" shape as [`rollup_evm::L2ExecutionDriver`]
//! (§9 "Dynamic dispatch and interface variants").
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use rollup_common::calldata::{encode_calldata, Value};
use rollup_common::events::OutgoingCall;
use rollup_common::hashing::concat;
use rollup_proof::Proof;
use rollup_rpc_client::RpcClientError;

/// Packs the ordered outgoing-call list into one bytes blob so the
/// abstract endpoint's verifier can replay each call and compare its
/// real L1 result against `expectedResults` (§4.4 step 4). This is a
/// plain length-prefixed wire format, not Solidity ABI — the rollup
/// contract's exact calldata shape is out of scope (§1) so any format
/// both sides agree on suffices.
pub fn encode_outgoing_calls_blob(calls: &[OutgoingCall]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(calls.len() as u64).to_be_bytes());
    for call in calls {
        let mut value = [0u8; 32];
        call.value.to_big_endian(&mut value);
        let mut gas = [0u8; 32];
        call.gas.to_big_endian(&mut gas);
        out.extend_from_slice(call.from.as_bytes());
        out.extend_from_slice(call.target.as_bytes());
        out.extend_from_slice(&value);
        out.extend_from_slice(&gas);
        out.extend_from_slice(&(call.data.len() as u64).to_be_bytes());
        out.extend_from_slice(&call.data);
        out.extend_from_slice(call.post_call_state_hash.as_bytes());
    }
    out
}

/// Packs the ordered expected-result list the same way.
pub fn encode_results_blob(results: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(results.len() as u64).to_be_bytes());
    for result in results {
        out.extend_from_slice(&(result.len() as u64).to_be_bytes());
        out.extend_from_slice(result);
    }
    out
}

/// Parameters for `process-single-tx` (§4.4, §6).
pub struct ProcessSingleTxParams {
    pub prev_l2_root: H256,
    pub rlp_encoded_tx: Vec<u8>,
    pub post_execution_root: H256,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub expected_results: Vec<Vec<u8>>,
    pub final_l2_root: H256,
    pub proof: Proof,
}

/// Parameters for `register-incoming-call` (§4.4, §6).
pub struct RegisterIncomingCallParams {
    pub l2_target: Address,
    pub prev_l2_root: H256,
    pub call_data: Vec<u8>,
    pub response: Vec<u8>,
    pub proof: Proof,
}

/// The three abstract rollup endpoints the Builder invokes (§6), plus a
/// read used to avoid redundant proxy deploys (§4.4 step 1 "if its
/// L2→L1 proxy is not deployed on L1"). Everything here is a write to,
/// or a read of, the external L1 rollup contract — no local state.
#[async_trait]
pub trait RollupEndpoint: Send + Sync {
    async fn process_single_tx(&self, params: ProcessSingleTxParams) -> Result<H256, RpcClientError>;

    async fn register_incoming_call(
        &self,
        params: RegisterIncomingCallParams,
    ) -> Result<H256, RpcClientError>;

    async fn deploy_l2_sender_proxy(&self, l2_address: Address) -> Result<H256, RpcClientError>;

    /// Whether `proxy_address` (computed off-chain via §4.6) already has
    /// code on L1.
    async fn is_proxy_deployed(&self, proxy_address: Address) -> Result<bool, RpcClientError>;
}

/// The reference binding: plain ABI-encoded calldata broadcast as a
/// signed L1 transaction via [`RpcClient`], mirroring how
/// `rollup_contracts` encodes calls to the L2 genesis contracts.
pub struct RpcRollupEndpoint {
    client: rollup_rpc_client::RpcClient,
    rollup_address: Address,
    sender: Address,
    signing_key: secp256k1::SecretKey,
}

impl RpcRollupEndpoint {
    pub fn new(
        client: rollup_rpc_client::RpcClient,
        rollup_address: Address,
        sender: Address,
        signing_key: secp256k1::SecretKey,
    ) -> Self {
        Self {
            client,
            rollup_address,
            sender,
            signing_key,
        }
    }

    /// Signs and broadcasts one call to the rollup contract, the L1-side
    /// analogue of `L2ExecutionDriver::execute_raw_tx`: this crate never
    /// impersonates on L1 (§4.1.3's privileged-sender story is purely
    /// L2-side), so every rollup call is a normally signed transaction.
    async fn send(&self, data: Vec<u8>, value: U256) -> Result<H256, RpcClientError> {
        let nonce = self
            .client
            .get_transaction_count(self.sender, rollup_rpc_client::BlockIdentifier::Latest)
            .await?;
        let gas_price = self.client.gas_price().await?;
        let mut tx = rollup_common::tx::SignedL2Transaction {
            nonce,
            gas_price,
            gas_limit: 2_000_000,
            to: rollup_common::tx::TxKind::Call(self.rollup_address),
            value,
            data,
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
        };
        sign_tx(&mut tx, &self.signing_key);
        self.client.send_raw_transaction(&tx.encode()).await
    }
}

fn sign_tx(tx: &mut rollup_common::tx::SignedL2Transaction, key: &secp256k1::SecretKey) {
    let secp = secp256k1::Secp256k1::signing_only();
    let message = secp256k1::Message::from_digest(tx.signing_hash().to_fixed_bytes());
    let (recovery_id, signature) = secp
        .sign_ecdsa_recoverable(&message, key)
        .serialize_compact();
    tx.r = U256::from_big_endian(&signature[0..32]);
    tx.s = U256::from_big_endian(&signature[32..64]);
    tx.v = recovery_id.to_i32() as u64;
}

#[async_trait]
impl RollupEndpoint for RpcRollupEndpoint {
    async fn process_single_tx(&self, params: ProcessSingleTxParams) -> Result<H256, RpcClientError> {
        let calls_blob = encode_outgoing_calls_blob(&params.outgoing_calls);
        let results_blob = encode_results_blob(&params.expected_results);
        let calldata = encode_calldata(
            "processSingleTx(bytes32,bytes,bytes32,bytes,bytes,bytes32,bytes)",
            &[
                Value::FixedBytes(params.prev_l2_root.0),
                Value::Bytes(params.rlp_encoded_tx),
                Value::FixedBytes(params.post_execution_root.0),
                Value::Bytes(calls_blob),
                Value::Bytes(results_blob),
                Value::FixedBytes(params.final_l2_root.0),
                Value::Bytes(params.proof.as_bytes()),
            ],
        );
        self.send(calldata, U256::zero()).await
    }

    async fn register_incoming_call(
        &self,
        params: RegisterIncomingCallParams,
    ) -> Result<H256, RpcClientError> {
        let calldata = encode_calldata(
            "registerIncomingCall(address,bytes32,bytes,bytes,bytes)",
            &[
                Value::Address(params.l2_target),
                Value::FixedBytes(params.prev_l2_root.0),
                Value::Bytes(params.call_data),
                Value::Bytes(params.response),
                Value::Bytes(params.proof.as_bytes()),
            ],
        );
        self.send(calldata, U256::zero()).await
    }

    async fn deploy_l2_sender_proxy(&self, l2_address: Address) -> Result<H256, RpcClientError> {
        let calldata = encode_calldata(
            "deployL2SenderProxy(address)",
            &[Value::Address(l2_address)],
        );
        self.send(calldata, U256::zero()).await
    }

    async fn is_proxy_deployed(&self, proxy_address: Address) -> Result<bool, RpcClientError> {
        let code = self
            .client
            .get_code(proxy_address, rollup_rpc_client::BlockIdentifier::Latest)
            .await?;
        Ok(!code.is_empty())
    }
}

/// Preimage helper shared with proof-statement construction: the same
/// packed bytes a `RpcRollupEndpoint` would send, useful for logging or
/// for tests that want to assert on the exact wire bytes.
pub fn describe_blobs(calls: &[OutgoingCall], results: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let calls_blob = encode_outgoing_calls_blob(calls);
    let results_blob = encode_results_blob(results);
    (concat(&[calls_blob.as_slice()]), results_blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_calls_blob_round_trips_count() {
        let calls = vec![OutgoingCall {
            from: Address::from_low_u64_be(1),
            target: Address::from_low_u64_be(2),
            value: U256::zero(),
            gas: U256::from(21_000),
            data: vec![1, 2, 3],
            post_call_state_hash: H256::zero(),
        }];
        let blob = encode_outgoing_calls_blob(&calls);
        assert_eq!(&blob[0..8], &1u64.to_be_bytes());
    }

    #[test]
    fn results_blob_is_length_prefixed() {
        let blob = encode_results_blob(&[vec![0xaa, 0xbb]]);
        assert_eq!(&blob[0..8], &1u64.to_be_bytes());
        assert_eq!(&blob[8..16], &2u64.to_be_bytes());
        assert_eq!(&blob[16..18], &[0xaa, 0xbb]);
    }
}
