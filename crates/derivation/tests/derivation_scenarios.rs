//! The concrete derivation scenarios, each exercised through the public
//! `DerivationEngine` API against a `FakeEvmDriver` rather than a live
//! Anvil process.
use ethereum_types::{Address, H256, U256};
use rollup_common::config::GenesisConfig;
use rollup_common::events::{
    EventDedupeKey, EventOrderKey, IncomingCallHandled, L1Event, L1EventBody, L2BlockProcessed,
    OutgoingCall,
};
use rollup_common::tx::{SignedL2Transaction, TxKind};
use rollup_derivation::{ApplyOutcome, DerivationEngine, DerivationError};
use rollup_evm::testing::FakeEvmDriver;
use rollup_evm::L2ExecutionDriver;
use secp256k1::{Message, Secp256k1, SecretKey};
use std::sync::Arc;

fn genesis_config(expected_genesis_root: H256) -> GenesisConfig {
    GenesisConfig {
        l2_chain_id: 1337,
        system_address: Address::from_low_u64_be(0xF00D),
        system_balance: U256::from(10).pow(U256::from(30)),
        block_gas_limit: 30_000_000,
        l1_deployment_block: 1,
        expected_genesis_root,
    }
}

/// Genesis construction rejects any `expected_genesis_root` that doesn't
/// match what a fresh `FakeEvmDriver` actually reaches after deploying the
/// two genesis contracts, so probe it once before building the engine
/// under test.
async fn bootstrap_fresh() -> DerivationEngine {
    let probe = Arc::new(FakeEvmDriver::new());
    let observed = match DerivationEngine::bootstrap(probe, genesis_config(H256::zero()), 1_700_000_000).await {
        Err(DerivationError::MisconfiguredGenesis { observed, .. }) => observed,
        other => panic!("expected MisconfiguredGenesis while probing, got {other:?}"),
    };

    let driver = Arc::new(FakeEvmDriver::new());
    DerivationEngine::bootstrap(driver, genesis_config(observed), 1_700_000_000)
        .await
        .unwrap()
}

fn signed_transfer(nonce: u64, key: &SecretKey, to: Address, value: U256) -> SignedL2Transaction {
    let mut tx = SignedL2Transaction {
        nonce,
        gas_price: U256::zero(),
        gas_limit: 21_000,
        to: TxKind::Call(to),
        value,
        data: vec![],
        v: 0,
        r: U256::zero(),
        s: U256::zero(),
    };
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(tx.signing_hash().to_fixed_bytes());
    let (recovery_id, signature) = secp.sign_ecdsa_recoverable(&message, key).serialize_compact();
    tx.r = U256::from_big_endian(&signature[0..32]);
    tx.s = U256::from_big_endian(&signature[32..64]);
    tx.v = recovery_id.to_i32() as u64;
    tx
}

fn incoming_call(
    l1_caller: Address,
    l2_target: Address,
    value: U256,
    prev_root: H256,
    final_root: H256,
    outgoing_calls: Vec<OutgoingCall>,
    outgoing_call_results: Vec<Vec<u8>>,
) -> L1Event {
    L1Event {
        order: EventOrderKey { l1_block_number: 10, log_index: 0 },
        dedupe: EventDedupeKey { tx_hash: H256::repeat_byte(0x11), log_index: 0 },
        l1_block_timestamp: 1_700_000_100,
        body: L1EventBody::IncomingCallHandled(IncomingCallHandled {
            l2_target,
            l1_caller,
            prev_l2_root: prev_root,
            call_data: vec![],
            value,
            outgoing_calls,
            outgoing_call_results,
            final_state_hash: final_root,
        }),
    }
}

fn l2_block_processed(
    rlp_encoded_tx: Vec<u8>,
    prev_root: H256,
    new_root: H256,
    outgoing_calls: Vec<OutgoingCall>,
    outgoing_call_results: Vec<Vec<u8>>,
) -> L1Event {
    L1Event {
        order: EventOrderKey { l1_block_number: 20, log_index: 0 },
        dedupe: EventDedupeKey { tx_hash: H256::repeat_byte(0x22), log_index: 0 },
        l1_block_timestamp: 1_700_000_200,
        body: L1EventBody::L2BlockProcessed(L2BlockProcessed {
            l2_block_number: 1,
            prev_l2_root: prev_root,
            new_l2_root: new_root,
            rlp_encoded_tx,
            outgoing_calls,
            outgoing_call_results,
        }),
    }
}

/// (A) Genesis-only: no events applied yet, L2 block number is zero and the
/// root is whatever this config's genesis construction deterministically
/// reaches.
#[tokio::test]
async fn scenario_a_genesis_only() {
    let engine = bootstrap_fresh().await;
    assert_eq!(engine.l2_block_number(), 0);
    let root = engine.current_state_root().await.unwrap();
    assert_ne!(root, H256::zero(), "genesis deploys should move the root away from zero");
}

/// (B) Single L1->L2 deposit: an `IncomingCallHandled` with no call data and
/// a nonzero value, applied against genesis. The L1->L2 proxy for the
/// caller must exist afterwards.
#[tokio::test]
async fn scenario_b_single_l1_to_l2_deposit() {
    let mut engine = bootstrap_fresh().await;
    let genesis_root = engine.current_state_root().await.unwrap();
    let l1_caller = Address::from_low_u64_be(0x01);
    let l2_target = Address::from_low_u64_be(0x02);
    let one_ether = U256::from(10).pow(U256::from(18));

    let probe_event = incoming_call(l1_caller, l2_target, one_ether, genesis_root, H256::zero(), vec![], vec![]);
    let observed = match engine.apply_event(&probe_event).await.unwrap_err() {
        DerivationError::StateDivergence { observed, .. } => observed,
        other => panic!("expected StateDivergence while probing, got {other:?}"),
    };

    let mut engine = bootstrap_fresh().await;
    let event = incoming_call(l1_caller, l2_target, one_ether, genesis_root, observed, vec![], vec![]);
    let outcome = engine.apply_event(&event).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied { new_root: observed });
    assert_eq!(engine.l2_block_number(), 1);

    let proxy = engine.ensure_l1_to_l2_proxy(l1_caller).await.unwrap();
    assert!(
        !engine.driver().get_code(proxy).await.unwrap().is_empty(),
        "the l1->l2 proxy must already have been deployed while applying the event"
    );
}

/// (C) L2 transaction with no outgoing calls: a plain signed transfer
/// between two L2 EOAs, carried as the event's `rlpEncodedTx`.
#[tokio::test]
async fn scenario_c_l2_transfer_with_no_outgoing_calls() {
    let mut engine = bootstrap_fresh().await;
    let genesis_root = engine.current_state_root().await.unwrap();
    let key = SecretKey::from_slice(&[0x33; 32]).unwrap();
    let tx = signed_transfer(0, &key, Address::from_low_u64_be(0x42), U256::from(1_000u64));

    let probe_event = l2_block_processed(tx.encode(), genesis_root, H256::zero(), vec![], vec![]);
    let observed = match engine.apply_event(&probe_event).await.unwrap_err() {
        DerivationError::StateDivergence { observed, .. } => observed,
        other => panic!("expected StateDivergence while probing, got {other:?}"),
    };

    let mut engine = bootstrap_fresh().await;
    let event = l2_block_processed(tx.encode(), genesis_root, observed, vec![], vec![]);
    let outcome = engine.apply_event(&event).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied { new_root: observed });
    assert_eq!(engine.l2_block_number(), 1);
}

/// (D) L2 transaction with one outgoing call: the registry entry is
/// committed before the transaction executes.
#[tokio::test]
async fn scenario_d_l2_transfer_with_one_outgoing_call() {
    let mut engine = bootstrap_fresh().await;
    let genesis_root = engine.current_state_root().await.unwrap();
    let key = SecretKey::from_slice(&[0x44; 32]).unwrap();
    let tx = signed_transfer(0, &key, Address::from_low_u64_be(0x55), U256::zero());

    let call = OutgoingCall {
        from: Address::from_low_u64_be(0x55),
        target: Address::from_low_u64_be(0xAB),
        value: U256::zero(),
        gas: U256::from(100_000u64),
        data: vec![0xde, 0xad, 0xbe, 0xef],
        post_call_state_hash: H256::zero(),
    };
    let result = vec![0x00; 31].into_iter().chain([0x2a]).collect::<Vec<u8>>();

    let probe_event = l2_block_processed(tx.encode(), genesis_root, H256::zero(), vec![call.clone()], vec![result.clone()]);
    let observed = match engine.apply_event(&probe_event).await.unwrap_err() {
        DerivationError::StateDivergence { observed, .. } => observed,
        other => panic!("expected StateDivergence while probing, got {other:?}"),
    };

    let mut engine = bootstrap_fresh().await;
    let event = l2_block_processed(tx.encode(), genesis_root, observed, vec![call], vec![result]);
    let outcome = engine.apply_event(&event).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied { new_root: observed });
}

/// (E) An L1->L2 call whose inner execution itself makes an L2->L1
/// outgoing call: both the registration and the forwarded privileged call
/// happen while applying the single event.
#[tokio::test]
async fn scenario_e_incoming_call_with_nested_outgoing_call() {
    let mut engine = bootstrap_fresh().await;
    let genesis_root = engine.current_state_root().await.unwrap();
    let l1_caller = Address::from_low_u64_be(0x01);
    let l2_target = Address::from_low_u64_be(0x02);

    let call = OutgoingCall {
        from: l2_target,
        target: Address::from_low_u64_be(0xCD),
        value: U256::zero(),
        gas: U256::from(100_000u64),
        data: vec![],
        post_call_state_hash: H256::zero(),
    };
    let result = vec![0x2a];

    let probe_event = incoming_call(l1_caller, l2_target, U256::zero(), genesis_root, H256::zero(), vec![call.clone()], vec![result.clone()]);
    let observed = match engine.apply_event(&probe_event).await.unwrap_err() {
        DerivationError::StateDivergence { observed, .. } => observed,
        other => panic!("expected StateDivergence while probing, got {other:?}"),
    };

    let mut engine = bootstrap_fresh().await;
    let event = incoming_call(l1_caller, l2_target, U256::zero(), genesis_root, observed, vec![call], vec![result]);
    let outcome = engine.apply_event(&event).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied { new_root: observed });
}

/// (F) Two events published with the same `prevL2Root`: only the first
/// one's effect survives, the second is skipped rather than reapplied or
/// rejected fatally.
#[tokio::test]
async fn scenario_f_competing_events_on_the_same_prev_root() {
    let mut engine = bootstrap_fresh().await;
    let genesis_root = engine.current_state_root().await.unwrap();
    let l1_caller = Address::from_low_u64_be(0x01);
    let l2_target = Address::from_low_u64_be(0x02);

    let probe_first = incoming_call(l1_caller, l2_target, U256::zero(), genesis_root, H256::zero(), vec![], vec![]);
    let first_root = match engine.apply_event(&probe_first).await.unwrap_err() {
        DerivationError::StateDivergence { observed, .. } => observed,
        other => panic!("expected StateDivergence while probing, got {other:?}"),
    };

    let mut engine = bootstrap_fresh().await;
    let first = incoming_call(l1_caller, l2_target, U256::zero(), genesis_root, first_root, vec![], vec![]);
    let outcome = engine.apply_event(&first).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied { new_root: first_root });

    // Same prevL2Root as `first`, but it no longer matches the now-advanced
    // current root, so this must be skipped rather than applied or erroring.
    let second = incoming_call(
        Address::from_low_u64_be(0x03),
        Address::from_low_u64_be(0x04),
        U256::zero(),
        genesis_root,
        H256::repeat_byte(0x99),
        vec![],
        vec![],
    );
    let outcome = engine.apply_event(&second).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Skipped);
    assert_eq!(engine.l2_block_number(), 1);
}
