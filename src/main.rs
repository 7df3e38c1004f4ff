//! BugHuntr Gateway
//!
//! An HTTP facade over an on-chain bug bounty contract, built with Tokio,
//! Axum and alloy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                  BUGHUNTR GATEWAY                  │
//!                         │                                                    │
//!     Client Request      │  ┌─────────┐    ┌──────────┐   writes              │
//!     ────────────────────┼─▶│  http   │───▶│ handlers │──────────┐            │
//!                         │  │ server  │    │          │          ▼            │
//!                         │  └─────────┘    └────┬─────┘   ┌────────────┐      │
//!                         │                      │ reads   │ sequencer  │      │
//!                         │                      ▼         │ FIFO, one  │      │
//!                         │               ┌────────────┐   │ in flight  │      │
//!                         │               │report cache│   └─────┬──────┘      │
//!                         │               └─────┬──────┘         │             │
//!                         │                     ▼                ▼             │
//!                         │               ┌──────────────────────────┐         │      EVM
//!                         │               │ blockchain (ChainClient) │─────────┼────▶ JSON-RPC
//!                         │               └──────────────────────────┘         │      node
//!                         │                                                    │
//!                         │   config · observability · lifecycle (signals)     │
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use bughuntr_gateway::blockchain::{BlockchainClient, ChainClient, Wallet};
use bughuntr_gateway::config::load_config;
use bughuntr_gateway::http::{AppState, HttpServer};
use bughuntr_gateway::lifecycle::shutdown_signal;
use bughuntr_gateway::observability::{logging, metrics};
use bughuntr_gateway::reports::ReportCache;
use bughuntr_gateway::sequencer::{PendingTransactions, Sequencer};

#[derive(Parser)]
#[command(name = "bughuntr-gateway")]
#[command(about = "HTTP gateway for the BugHuntr bounty contract", long_about = None)]
struct Args {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long, env = "BUGHUNTR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability.log_level);

    tracing::info!("bughuntr-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        rpc_url = %config.chain.rpc_url,
        contract = %config.chain.contract_address,
        chain_id = config.chain.chain_id,
        request_timeout_secs = config.gateway.request_timeout_secs,
        cache_enabled = config.cache.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let wallet = Wallet::from_env(config.chain.chain_id)?;
    let client = BlockchainClient::new(config.chain.clone(), wallet).await?;
    let chain: Arc<dyn ChainClient> = Arc::new(client);

    let pending = PendingTransactions::new();
    let cache_ttl = Duration::from_secs(config.cache.ttl_secs);
    let cache = config.cache.enabled.then(|| ReportCache::new(cache_ttl));
    if let Some(cache) = &cache {
        // Entries nobody reads again would otherwise stay forever.
        cache.spawn_sweeper(cache_ttl.max(Duration::from_secs(1)));
    }

    let (sequencer, handle) = Sequencer::new(
        chain.clone(),
        config.gateway.queue_capacity,
        pending.clone(),
        cache.clone(),
    );
    let sequencer_task = tokio::spawn(sequencer.run());

    let state = AppState::new(
        chain,
        handle,
        pending,
        cache,
        config.gateway.request_timeout_secs,
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The router owns the last sequencer handle; once it is dropped the
    // sequencer finishes its queue and exits.
    HttpServer::new(&config, state)
        .run(listener, shutdown_signal())
        .await?;

    tracing::info!("Draining transaction sequencer");
    if let Err(e) = sequencer_task.await {
        tracing::error!(error = %e, "Sequencer task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
