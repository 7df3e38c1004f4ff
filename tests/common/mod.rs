//! Shared utilities for integration testing: an in-memory bounty contract and
//! a helper that serves the real router on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;
use tokio::net::TcpListener;

use bughuntr_gateway::blockchain::{ChainClient, ChainError, ChainResult, TxStatus};
use bughuntr_gateway::config::GatewayConfig;
use bughuntr_gateway::http::{AppState, HttpServer};
use bughuntr_gateway::reports::{BugReport, IntentKind, ReportCache, ReportStatus, WriteIntent};
use bughuntr_gateway::sequencer::{PendingTransactions, Sequencer};

/// The account every write is signed with.
pub const SIGNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// Wei per severity point.
pub const REWARD_UNIT: u64 = 1_000_000_000_000_000_000;

#[derive(Default)]
struct ContractState {
    reports: Vec<BugReport>,
    receipts: HashMap<TxHash, u64>,
    block: u64,
}

/// In-memory stand-in for the bounty contract. Writes apply when sent;
/// confirmation optionally takes `confirm_delay`.
pub struct MockChain {
    state: Mutex<ContractState>,
    confirm_delay: Duration,
    read_delay_ms: AtomicU64,
    healthy: AtomicBool,
    sends: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sent: Mutex<Vec<IntentKind>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_confirm_delay(Duration::ZERO)
    }

    pub fn with_confirm_delay(confirm_delay: Duration) -> Self {
        Self {
            state: Mutex::new(ContractState::default()),
            confirm_delay,
            read_delay_ms: AtomicU64::new(0),
            healthy: AtomicBool::new(true),
            sends: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Number of writes that reached the chain, failed or not.
    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Intents in broadcast order.
    pub fn sent(&self) -> Vec<IntentKind> {
        self.sent.lock().unwrap().clone()
    }

    /// Report reads snapshot the state, then take `delay` to answer.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Insert a report directly, bypassing the gateway.
    pub fn seed_report(&self, description: &str) -> U256 {
        let mut state = self.state.lock().unwrap();
        let id = U256::from(state.reports.len());
        state.reports.push(new_report(id, description, "seeded"));
        id
    }

    fn apply(&self, intent: &WriteIntent) -> ChainResult<TxHash> {
        let mut state = self.state.lock().unwrap();

        match intent {
            WriteIntent::Submit {
                description,
                proof_of_concept,
            } => {
                let id = U256::from(state.reports.len());
                state
                    .reports
                    .push(new_report(id, description, proof_of_concept));
            }
            WriteIntent::Approve {
                report_id,
                severity,
            } => {
                let report = find_mut(&mut state.reports, *report_id)?;
                require(report.status() == Some(ReportStatus::Pending), "Report already processed")?;
                report.is_approved = true;
                report.severity = Some(severity.get());
                report.reward = U256::from(severity.get()) * U256::from(REWARD_UNIT);
            }
            WriteIntent::Reject { report_id } => {
                let report = find_mut(&mut state.reports, *report_id)?;
                require(report.status() == Some(ReportStatus::Pending), "Report already processed")?;
                report.is_rejected = true;
            }
            WriteIntent::Claim { report_id } => {
                let report = find_mut(&mut state.reports, *report_id)?;
                require(report.is_approved, "Report not approved")?;
                require(!report.is_claimed, "Reward already claimed")?;
                report.is_claimed = true;
            }
        }

        state.block += 1;
        let tx_hash = TxHash::from(U256::from(state.block).to_be_bytes::<32>());
        let block = state.block;
        state.receipts.insert(tx_hash, block);
        Ok(tx_hash)
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

fn new_report(id: U256, description: &str, proof_of_concept: &str) -> BugReport {
    BugReport {
        id,
        reporter: SIGNER,
        description: description.to_string(),
        proof_of_concept: proof_of_concept.to_string(),
        timestamp: U256::from(1_700_000_000u64) + id,
        severity: None,
        reward: U256::ZERO,
        is_approved: false,
        is_rejected: false,
        is_claimed: false,
    }
}

fn find_mut(reports: &mut [BugReport], id: U256) -> ChainResult<&mut BugReport> {
    reports
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(ChainError::ReportNotFound(id))
}

fn require(condition: bool, reason: &str) -> ChainResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ChainError::Reverted(format!("execution reverted: {}", reason)))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn send(&self, intent: &WriteIntent) -> ChainResult<TxHash> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.sent.lock().unwrap().push(intent.kind());

        let result = self.apply(intent);
        if result.is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    async fn confirm(&self, tx_hash: TxHash) -> ChainResult<u64> {
        tokio::time::sleep(self.confirm_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        state
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| ChainError::Rpc(format!("no receipt for {}", tx_hash)))
    }

    async fn get_report(&self, report_id: U256) -> ChainResult<BugReport> {
        let snapshot = {
            let state = self.state.lock().unwrap();
            state
                .reports
                .iter()
                .find(|r| r.id == report_id)
                .cloned()
                .ok_or(ChainError::ReportNotFound(report_id))
        };
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        snapshot
    }

    async fn get_user_reports(&self, reporter: Address) -> ChainResult<Vec<U256>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reports
            .iter()
            .filter(|r| r.reporter == reporter)
            .map(|r| r.id)
            .collect())
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> ChainResult<TxStatus> {
        let state = self.state.lock().unwrap();
        Ok(match state.receipts.get(&tx_hash) {
            Some(&block_number) => TxStatus::Confirmed { block_number },
            None => TxStatus::Unknown,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// A gateway served on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub chain: Arc<MockChain>,
    pub client: reqwest::Client,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the full stack (router, sequencer, cache) against `chain`.
pub async fn start_gateway(chain: Arc<MockChain>, config: GatewayConfig) -> TestGateway {
    let pending = PendingTransactions::new();
    let cache = config
        .cache
        .enabled
        .then(|| ReportCache::new(Duration::from_secs(config.cache.ttl_secs)));

    let dyn_chain: Arc<dyn ChainClient> = chain.clone();
    let (sequencer, handle) = Sequencer::new(
        dyn_chain.clone(),
        config.gateway.queue_capacity,
        pending.clone(),
        cache.clone(),
    );
    tokio::spawn(sequencer.run());

    let state = AppState::new(
        dyn_chain,
        handle,
        pending,
        cache,
        config.gateway.request_timeout_secs,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, state);
    tokio::spawn(async move {
        let _ = server.run(listener, std::future::pending()).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestGateway {
        addr,
        chain,
        client,
    }
}

/// Default config with the cache on and a generous request deadline.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.chain.contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".into();
    config
}
