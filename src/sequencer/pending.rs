//! Registry of broadcast-but-unconfirmed transactions.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{TxHash, U256};
use dashmap::DashMap;

use crate::observability::metrics;
use crate::reports::types::IntentKind;

/// A write the sequencer has broadcast and is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: TxHash,
    /// Absent for submits; the id is assigned on chain.
    pub report_id: Option<U256>,
    pub intent: IntentKind,
    /// When the intent entered the queue, unix seconds.
    pub enqueued_at: u64,
}

/// Shared view of in-flight transactions, readable by the gateway.
#[derive(Debug, Clone, Default)]
pub struct PendingTransactions {
    inner: Arc<DashMap<TxHash, PendingTransaction>>,
}

impl PendingTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tx: PendingTransaction) {
        self.inner.insert(tx.tx_hash, tx);
        metrics::record_pending_transactions(self.inner.len());
    }

    pub fn remove(&self, tx_hash: &TxHash) -> Option<PendingTransaction> {
        let removed = self.inner.remove(tx_hash).map(|(_, tx)| tx);
        metrics::record_pending_transactions(self.inner.len());
        removed
    }

    pub fn get(&self, tx_hash: &TxHash) -> Option<PendingTransaction> {
        self.inner.get(tx_hash).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Current time in unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
