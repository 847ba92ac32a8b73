//! The Builder binary (§2, §4.4): runs a private `DerivationEngine` fed
//! by its own L1 event feed (so discovery simulations run against state
//! that mirrors the canonical chain), and serves `submit`/`status` over
//! JSON-RPC. Signing keys are read from the environment rather than CLI
//! flags so they never show up in argv or `--help`.
use anyhow::{Context, Result};
use clap::Parser;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rollup_common::config::GenesisConfig;
use rollup_common::events::L1Event;
use rollup_derivation::DerivationEngine;
use rollup_evm::AnvilDriver;
use rollup_events::{EventSourceConfig, L1EventSource};
use rollup_proof::ProofScheme;
use rollup_rpc_client::{BlockIdentifier, RpcClient};
use rollup_rpc_server::{serve_builder, BuilderContext, SyncHealth};
use rollup_submitter::{sync_gate_channel, RollupEndpoint, RpcRollupEndpoint, Submitter, SubmitterConfig, SyncGateHandle};
use secp256k1::SecretKey;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "builder", about = "Cross-chain call discovery and L1 submission pipeline")]
struct Cli {
    #[arg(long, env = "BUILDER_L1_RPC_URL")]
    l1_rpc_url: reqwest::Url,

    /// JSON-RPC endpoint of the Builder's own scratch Anvil instance,
    /// distinct from the Fullnode's (§2, §5: discovery runs against a
    /// private simulation, never the canonical node).
    #[arg(long, env = "BUILDER_L2_RPC_URL")]
    l2_rpc_url: reqwest::Url,

    #[arg(long, env = "BUILDER_ROLLUP_ADDRESS")]
    rollup_address: Address,

    #[arg(long, env = "BUILDER_L1_DEPLOYMENT_BLOCK")]
    l1_deployment_block: u64,

    #[arg(long, env = "BUILDER_SYSTEM_ADDRESS")]
    system_address: Address,

    #[arg(long, env = "BUILDER_SYSTEM_BALANCE", default_value = "1000000000000000000000000000000")]
    system_balance: String,

    #[arg(long, env = "BUILDER_BLOCK_GAS_LIMIT", default_value_t = 30_000_000)]
    block_gas_limit: u64,

    #[arg(long, env = "BUILDER_EXPECTED_GENESIS_ROOT")]
    expected_genesis_root: H256,

    #[arg(long, env = "BUILDER_MAX_BLOCK_STEP", default_value_t = 2_000)]
    max_block_step: u64,

    #[arg(long, env = "BUILDER_POLL_INTERVAL_MS", default_value_t = 4_000)]
    poll_interval_ms: u64,

    /// Bounds the outgoing-call fixed-point discovery loop (§4.3.3).
    #[arg(long, env = "BUILDER_MAX_DISCOVERY_ITERATIONS", default_value_t = rollup_discovery::DEFAULT_MAX_ITERATIONS)]
    max_discovery_iterations: u32,

    /// How many times a submit restarts discovery after a lost tip-lock race (§5).
    #[arg(long, env = "BUILDER_MAX_STATE_RACE_RETRIES", default_value_t = 3)]
    max_state_race_retries: u32,

    #[arg(long, env = "BUILDER_SYNC_WAIT_TIMEOUT_SECS", default_value_t = 30)]
    sync_wait_timeout_secs: u64,

    /// §4.4.1, off by default per §9.
    #[arg(long, env = "BUILDER_EXPIRY_SWEEP_ENABLED", default_value_t = false)]
    expiry_sweep_enabled: bool,

    #[arg(long, env = "BUILDER_EXPIRY_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    expiry_sweep_interval_secs: u64,

    #[arg(long, env = "BUILDER_HTTP_ADDR", default_value = "127.0.0.1:8552")]
    http_addr: SocketAddr,
}

/// Signing material, read straight from the environment (never via
/// `clap`) so it never lands in process argv or `--help` output.
#[derive(serde::Deserialize)]
struct Secrets {
    admin_signing_key: String,
    l1_sender_signing_key: String,
}

fn address_from_key(key: &SecretKey) -> Address {
    let public_key = key.public_key(secp256k1::SECP256K1);
    let hash = keccak(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash.as_bytes()[12..])
}

fn parse_secret_key(hex_str: &str) -> Result<SecretKey> {
    let bytes = hex::decode(hex_str.trim_start_matches("0x")).context("signing key is not valid hex")?;
    SecretKey::from_slice(&bytes).context("signing key is not a valid secp256k1 scalar")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let secrets: Secrets = envy::prefixed("BUILDER_")
        .from_env()
        .context("reading BUILDER_ADMIN_SIGNING_KEY / BUILDER_L1_SENDER_SIGNING_KEY from env")?;

    let admin_key = parse_secret_key(&secrets.admin_signing_key)?;
    let l1_sender_key = parse_secret_key(&secrets.l1_sender_signing_key)?;
    let l1_sender_address = address_from_key(&l1_sender_key);

    let system_balance = U256::from_dec_str(&cli.system_balance)
        .context("BUILDER_SYSTEM_BALANCE must be a decimal integer")?;

    let l1_client = RpcClient::new(cli.l1_rpc_url.clone());
    let l2_client = RpcClient::new(cli.l2_rpc_url.clone());

    let genesis_config = GenesisConfig {
        l2_chain_id: l2_client.chain_id().await.context("fetching l2 chain id")?,
        system_address: cli.system_address,
        system_balance,
        block_gas_limit: cli.block_gas_limit,
        l1_deployment_block: cli.l1_deployment_block,
        expected_genesis_root: cli.expected_genesis_root,
    };

    let genesis_timestamp = l1_client
        .get_block_by_number(BlockIdentifier::Number(cli.l1_deployment_block))
        .await
        .context("fetching l1 deployment block")?
        .ok_or_else(|| anyhow::anyhow!("l1 deployment block {} not found", cli.l1_deployment_block))?
        .timestamp;

    let driver = Arc::new(AnvilDriver::new(l2_client));
    let engine = DerivationEngine::bootstrap(driver, genesis_config, genesis_timestamp)
        .await
        .context("genesis construction failed for the builder's private engine")?;
    let engine = Arc::new(RwLock::new(engine));

    let health = Arc::new(RwLock::new(SyncHealth::default()));
    let (gate_handle, gate) = sync_gate_channel();

    let rollup: Arc<dyn RollupEndpoint> = Arc::new(RpcRollupEndpoint::new(
        l1_client.clone(),
        cli.rollup_address,
        l1_sender_address,
        l1_sender_key,
    ));

    let submitter = Arc::new(Submitter::new(
        SubmitterConfig {
            rollup_address: cli.rollup_address,
            max_discovery_iterations: cli.max_discovery_iterations,
            max_state_race_retries: cli.max_state_race_retries,
            sync_wait_timeout: Duration::from_secs(cli.sync_wait_timeout_secs),
            expiry_sweep_enabled: cli.expiry_sweep_enabled,
            expiry_sweep_interval: Duration::from_secs(cli.expiry_sweep_interval_secs),
        },
        l1_client.clone(),
        rollup,
        ProofScheme::admin_signature(admin_key),
        gate,
    ));

    let (event_tx, event_rx) = mpsc::channel(1024);
    let source = L1EventSource::new(
        l1_client.clone(),
        EventSourceConfig {
            rollup_address: cli.rollup_address,
            l1_deployment_block: cli.l1_deployment_block,
            max_block_step: cli.max_block_step,
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
        },
    );

    let source_task = tokio::spawn(source.run(event_tx));
    let apply_task = tokio::spawn(drive_private_engine(
        event_rx,
        engine.clone(),
        gate_handle,
        health.clone(),
        l1_client,
    ));

    let rpc_task = tokio::spawn(serve_builder(
        cli.http_addr,
        BuilderContext {
            engine,
            submitter,
            health,
        },
    ));

    tokio::select! {
        res = source_task => { res?; }
        res = apply_task => { res??; }
        res = rpc_task => { res??; }
    }

    Ok(())
}

/// Feeds the private engine the same event stream the Fullnode replays,
/// so discovery simulations never drift from what the canonical chain
/// will eventually see. Marks the sync gate caught-up only once every
/// buffered event has drained and the feed's last-seen L1 block is at
/// the observed tip (§4.4 step 1, §5).
async fn drive_private_engine(
    mut event_rx: mpsc::Receiver<L1Event>,
    engine: Arc<RwLock<DerivationEngine>>,
    gate: SyncGateHandle,
    health: Arc<RwLock<SyncHealth>>,
    l1_client: RpcClient,
) -> Result<(), rollup_derivation::DerivationError> {
    while let Some(event) = event_rx.recv().await {
        gate.set_caught_up(false);
        let l1_block = event.order.l1_block_number;

        let mut guard = engine.write().await;
        let outcome = guard.apply_event(&event).await?;
        let l2_block_number = guard.l2_block_number();
        drop(guard);

        if let rollup_derivation::ApplyOutcome::Applied { new_root } = outcome {
            info!(l1_block, %new_root, l2_block_number, "builder's private engine applied l1 event");
        }

        let mut h = health.write().await;
        h.last_l1_block_seen = l1_block;
        h.l2_block_number = l2_block_number;
        drop(h);

        if event_rx.is_empty() {
            let caught_up = match l1_client.block_number().await {
                Ok(tip) => l1_block >= tip,
                Err(_) => false,
            };
            gate.set_caught_up(caught_up);
            health.write().await.caught_up = caught_up;
        }
    }

    error!("l1 event source closed its channel, private engine can no longer advance");
    Ok(())
}
