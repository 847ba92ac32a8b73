//! The Fullnode binary (§2): replays L1 events into a canonical
//! `DerivationEngine` and serves the result over a read-only JSON-RPC
//! surface. Structured the way the teacher's node binary is laid out:
//! parse config, wire the pieces, spawn the event-driven tasks, wait.
use anyhow::{Context, Result};
use clap::Parser;
use ethereum_types::{Address, H256, U256};
use rollup_common::config::GenesisConfig;
use rollup_derivation::{DerivationEngine, DerivationError};
use rollup_evm::AnvilDriver;
use rollup_events::{EventSourceConfig, L1EventSource};
use rollup_rpc_client::{BlockIdentifier, RpcClient};
use rollup_rpc_server::{serve_fullnode, FullnodeContext, SyncHealth};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fullnode", about = "Canonical L2 state derivation and read RPC")]
struct Cli {
    /// JSON-RPC endpoint of the L1 chain the rollup contract is deployed on.
    #[arg(long, env = "FULLNODE_L1_RPC_URL")]
    l1_rpc_url: reqwest::Url,

    /// JSON-RPC endpoint of the Anvil-compatible L2 execution node.
    #[arg(long, env = "FULLNODE_L2_RPC_URL")]
    l2_rpc_url: reqwest::Url,

    /// Address of the L1 rollup contract.
    #[arg(long, env = "FULLNODE_ROLLUP_ADDRESS")]
    rollup_address: Address,

    /// L1 block at which the rollup contract was deployed; catch-up starts here.
    #[arg(long, env = "FULLNODE_L1_DEPLOYMENT_BLOCK")]
    l1_deployment_block: u64,

    /// The System Address credited at genesis.
    #[arg(long, env = "FULLNODE_SYSTEM_ADDRESS")]
    system_address: Address,

    /// Starting balance credited to the System Address at genesis, decimal wei.
    #[arg(long, env = "FULLNODE_SYSTEM_BALANCE", default_value = "1000000000000000000000000000000")]
    system_balance: String,

    /// Block gas limit used for every derived L2 block.
    #[arg(long, env = "FULLNODE_BLOCK_GAS_LIMIT", default_value_t = 30_000_000)]
    block_gas_limit: u64,

    /// State root the L1 rollup contract recorded at deployment.
    #[arg(long, env = "FULLNODE_EXPECTED_GENESIS_ROOT")]
    expected_genesis_root: H256,

    /// Caps a single `eth_getLogs` window (§4.2.1).
    #[arg(long, env = "FULLNODE_MAX_BLOCK_STEP", default_value_t = 2_000)]
    max_block_step: u64,

    /// Poll interval for new L1 events once caught up.
    #[arg(long, env = "FULLNODE_POLL_INTERVAL_MS", default_value_t = 4_000)]
    poll_interval_ms: u64,

    /// Address to bind the `eth_*` read RPC server on.
    #[arg(long, env = "FULLNODE_HTTP_ADDR", default_value = "127.0.0.1:8551")]
    http_addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let system_balance = U256::from_dec_str(&cli.system_balance)
        .context("FULLNODE_SYSTEM_BALANCE must be a decimal integer")?;

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

    // §9: genesis timestamp MUST come from the L1 deployment block, never
    // the wall clock.
    let genesis_timestamp = l1_client
        .get_block_by_number(BlockIdentifier::Number(cli.l1_deployment_block))
        .await
        .context("fetching l1 deployment block")?
        .ok_or_else(|| anyhow::anyhow!("l1 deployment block {} not found", cli.l1_deployment_block))?
        .timestamp;

    let driver = Arc::new(AnvilDriver::new(l2_client.clone()));
    let engine = DerivationEngine::bootstrap(driver, genesis_config, genesis_timestamp)
        .await
        .context("genesis construction failed")?;
    let engine = Arc::new(RwLock::new(engine));

    let health = Arc::new(RwLock::new(SyncHealth::default()));

    let (event_tx, event_rx) = mpsc::channel(1024);
    let source = L1EventSource::new(
        l1_client,
        EventSourceConfig {
            rollup_address: cli.rollup_address,
            l1_deployment_block: cli.l1_deployment_block,
            max_block_step: cli.max_block_step,
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
        },
    );

    let source_task = tokio::spawn(source.run(event_tx));
    let apply_task = tokio::spawn(drive_canonical_engine(event_rx, engine.clone(), health.clone()));

    let rpc_task = tokio::spawn(serve_fullnode(
        cli.http_addr,
        FullnodeContext {
            engine,
            l2_client,
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

/// Drains the ordered event channel into the canonical engine. A state
/// divergence here is fatal (§4.1.4, §7): this task returns an error and
/// the binary exits non-zero rather than continuing to serve stale or
/// wrong state.
async fn drive_canonical_engine(
    mut event_rx: mpsc::Receiver<rollup_common::events::L1Event>,
    engine: Arc<RwLock<DerivationEngine>>,
    health: Arc<RwLock<SyncHealth>>,
) -> Result<(), DerivationError> {
    while let Some(event) = event_rx.recv().await {
        let l1_block = event.order.l1_block_number;
        let mut guard = engine.write().await;
        let outcome = guard.apply_event(&event).await?;
        let l2_block_number = guard.l2_block_number();
        drop(guard);

        if let rollup_derivation::ApplyOutcome::Applied { new_root } = outcome {
            info!(l1_block, %new_root, l2_block_number, "fullnode applied l1 event");
        }

        let mut h = health.write().await;
        h.last_l1_block_seen = l1_block;
        h.l2_block_number = l2_block_number;
        h.caught_up = event_rx.is_empty();
    }

    error!("l1 event source closed its channel, canonical engine can no longer advance");
    Ok(())
}
