//! Sequencer core logic - one write in flight at a time

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::blockchain::chain::ChainClient;
use crate::observability::metrics;
use crate::reports::cache::ReportCache;

use super::pending::{PendingTransaction, PendingTransactions};
use super::queue::{SequencerHandle, WriteJob};

/// Drains write jobs in FIFO order, broadcasting and confirming each one
/// before taking the next, so the signing account's nonces go out in order.
pub struct Sequencer {
    chain: Arc<dyn ChainClient>,
    rx: mpsc::Receiver<WriteJob>,
    pending: PendingTransactions,
    cache: Option<ReportCache>,
}

impl Sequencer {
    /// Create a new Sequencer and return its handle
    pub fn new(
        chain: Arc<dyn ChainClient>,
        queue_capacity: usize,
        pending: PendingTransactions,
        cache: Option<ReportCache>,
    ) -> (Self, SequencerHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity);

        let sequencer = Self {
            chain,
            rx,
            pending,
            cache,
        };

        (sequencer, SequencerHandle::new(tx))
    }

    /// Run the Sequencer loop (spawn as tokio task).
    ///
    /// Returns once every handle is dropped and the queue is drained.
    pub async fn run(mut self) {
        info!(capacity = self.rx.max_capacity(), "Sequencer started");

        while let Some(job) = self.rx.recv().await {
            metrics::record_queue_depth(self.rx.len());
            self.process(job).await;
        }

        info!("Sequencer shutting down");
    }

    async fn process(&self, job: WriteJob) {
        let WriteJob {
            intent,
            enqueued_at,
            dispatched_tx,
            response_tx,
        } = job;
        let kind = intent.kind();
        let report_id = intent.report_id();
        let started = Instant::now();

        let tx_hash = match self.chain.send(&intent).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(intent = %kind, report_id = ?report_id, error = %e, "Write rejected before broadcast");
                metrics::record_transaction(kind, "rejected");
                let _ = response_tx.send(Err(e));
                return;
            }
        };

        // The caller may be gone; the transaction is still followed to the end.
        let _ = dispatched_tx.send(tx_hash);
        self.pending.insert(PendingTransaction {
            tx_hash,
            report_id,
            intent: kind,
            enqueued_at,
        });

        let outcome = self.chain.confirm(tx_hash).await;
        self.pending.remove(&tx_hash);

        // A broadcast write may have landed even when the wait failed.
        if let (Some(cache), Some(id)) = (&self.cache, report_id) {
            cache.invalidate(&id);
        }

        match &outcome {
            Ok(block_number) => {
                info!(
                    tx_hash = %tx_hash,
                    intent = %kind,
                    report_id = ?report_id,
                    block_number,
                    "Transaction confirmed"
                );
                metrics::record_transaction(kind, "confirmed");
                metrics::record_confirmation_duration(kind, started);
            }
            Err(e) => {
                warn!(tx_hash = %tx_hash, intent = %kind, error = %e, "Transaction failed");
                metrics::record_transaction(kind, "failed");
            }
        }

        if response_tx.send(outcome.map(|_| tx_hash)).is_err() {
            debug!(tx_hash = %tx_hash, "Caller stopped waiting before the outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chain::TxStatus;
    use crate::blockchain::types::{ChainError, ChainResult};
    use crate::reports::types::{BugReport, WriteIntent};
    use crate::sequencer::SequencerError;
    use alloy::primitives::{Address, TxHash, U256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the order writes reach the chain and fails report id 13.
    #[derive(Default)]
    struct RecordingChain {
        order: Mutex<Vec<U256>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ChainClient for RecordingChain {
        async fn send(&self, intent: &WriteIntent) -> ChainResult<TxHash> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let id = intent.report_id().unwrap_or_default();
            if id == U256::from(13) {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                return Err(ChainError::Reverted("unlucky".into()));
            }
            self.order.lock().unwrap().push(id);
            Ok(TxHash::from(id.to_be_bytes::<32>()))
        }

        async fn confirm(&self, _tx_hash: TxHash) -> ChainResult<u64> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(1)
        }

        async fn get_report(&self, report_id: U256) -> ChainResult<BugReport> {
            Err(ChainError::ReportNotFound(report_id))
        }

        async fn get_user_reports(&self, _reporter: Address) -> ChainResult<Vec<U256>> {
            Ok(Vec::new())
        }

        async fn transaction_status(&self, _tx_hash: TxHash) -> ChainResult<TxStatus> {
            Ok(TxStatus::Unknown)
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn reject(id: u64) -> WriteIntent {
        WriteIntent::Reject {
            report_id: U256::from(id),
        }
    }

    #[tokio::test]
    async fn test_writes_follow_enqueue_order() {
        let chain = Arc::new(RecordingChain::default());
        let (sequencer, handle) = Sequencer::new(chain.clone(), 16, PendingTransactions::new(), None);
        let task = tokio::spawn(sequencer.run());

        // join! polls in argument order, so enqueue order is 1, 2, 3.
        let (a, b, c) = tokio::join!(
            handle.enqueue(reject(1)),
            handle.enqueue(reject(2)),
            handle.enqueue(reject(3)),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(
            *chain.order.lock().unwrap(),
            vec![U256::from(1), U256::from(2), U256::from(3)]
        );
        assert_eq!(chain.max_in_flight.load(Ordering::SeqCst), 1);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let chain = Arc::new(RecordingChain::default());
        let (sequencer, handle) = Sequencer::new(chain.clone(), 16, PendingTransactions::new(), None);
        tokio::spawn(sequencer.run());

        let (bad, good) = tokio::join!(handle.enqueue(reject(13)), handle.enqueue(reject(14)));

        assert!(matches!(bad, Err(SequencerError::Chain(ChainError::Reverted(_)))));
        assert_eq!(good.unwrap(), TxHash::from(U256::from(14).to_be_bytes::<32>()));
    }

    #[tokio::test]
    async fn test_confirmation_invalidates_cache_and_clears_registry() {
        let chain = Arc::new(RecordingChain::default());
        let pending = PendingTransactions::new();
        let cache = ReportCache::new(Duration::from_secs(60));
        let report = BugReport {
            id: U256::from(7),
            reporter: Address::repeat_byte(1),
            description: "d".into(),
            proof_of_concept: "p".into(),
            timestamp: U256::ZERO,
            severity: None,
            reward: U256::ZERO,
            is_approved: false,
            is_rejected: false,
            is_claimed: false,
        };
        assert!(cache.insert(report, cache.epoch()));

        let (sequencer, handle) = Sequencer::new(chain, 16, pending.clone(), Some(cache.clone()));
        tokio::spawn(sequencer.run());

        handle.enqueue(reject(7)).await.unwrap();

        assert!(cache.get(&U256::from(7)).is_none());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_sequencer_exits_after_draining() {
        let chain = Arc::new(RecordingChain::default());
        let (sequencer, handle) = Sequencer::new(chain.clone(), 16, PendingTransactions::new(), None);
        let task = tokio::spawn(sequencer.run());

        let pending_write = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.enqueue(reject(21)).await })
        };
        drop(handle);

        assert!(pending_write.await.unwrap().is_ok());
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("sequencer should stop once all handles are dropped")
            .unwrap();
        assert_eq!(*chain.order.lock().unwrap(), vec![U256::from(21)]);
    }
}
