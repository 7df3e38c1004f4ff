//! Bounded FIFO of write jobs and the handle callers enqueue through.

use std::time::Duration;

use alloy::primitives::TxHash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout_at, Instant};

use crate::blockchain::types::{ChainError, ChainResult};
use crate::observability::metrics;
use crate::reports::types::WriteIntent;

/// Why an enqueued write did not produce a confirmed hash.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The write was attempted and failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The caller stopped waiting. The job keeps running in the sequencer.
    #[error("{}", timeout_message(.tx_hash))]
    Timeout { tx_hash: Option<TxHash> },

    /// The sequencer task is gone (shutdown).
    #[error("transaction sequencer is not running")]
    Closed,
}

fn timeout_message(tx_hash: &Option<TxHash>) -> String {
    match tx_hash {
        Some(hash) => format!(
            "timed out waiting for confirmation of {}; the transaction may still confirm",
            hash
        ),
        None => "timed out waiting for the transaction to be dispatched".to_string(),
    }
}

/// A single write with its completion channels.
#[derive(Debug)]
pub struct WriteJob {
    pub intent: WriteIntent,
    /// Unix seconds at enqueue time.
    pub enqueued_at: u64,
    /// Signaled with the hash once the node accepted the transaction.
    pub dispatched_tx: oneshot::Sender<TxHash>,
    /// Signaled with the final outcome.
    pub response_tx: oneshot::Sender<ChainResult<TxHash>>,
}

/// Handle for submitting writes to the sequencer.
#[derive(Debug, Clone)]
pub struct SequencerHandle {
    tx: mpsc::Sender<WriteJob>,
}

impl SequencerHandle {
    pub(crate) fn new(tx: mpsc::Sender<WriteJob>) -> Self {
        Self { tx }
    }

    /// Queue a write and wait, without bound, for its outcome.
    pub async fn enqueue(&self, intent: WriteIntent) -> Result<TxHash, SequencerError> {
        self.enqueue_with_deadline(intent, None).await
    }

    /// Queue a write and wait at most `deadline` for its outcome.
    ///
    /// The deadline covers waiting for room in a full queue as well as the
    /// confirmation. A job that never got a slot is not queued. Once queued,
    /// giving up (deadline or dropping the future) never withdraws it.
    pub async fn enqueue_with_deadline(
        &self,
        intent: WriteIntent,
        deadline: Option<Duration>,
    ) -> Result<TxHash, SequencerError> {
        let deadline_at = deadline.map(|d| Instant::now() + d);
        let (dispatched_tx, mut dispatched_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();

        let job = WriteJob {
            intent,
            enqueued_at: crate::sequencer::pending::unix_now(),
            dispatched_tx,
            response_tx,
        };

        let sent = match deadline_at {
            None => self.tx.send(job).await,
            Some(at) => match timeout_at(at, self.tx.send(job)).await {
                Ok(sent) => sent,
                Err(_) => {
                    tracing::warn!(capacity = self.tx.max_capacity(), "Write queue full until the deadline");
                    return Err(SequencerError::Timeout { tx_hash: None });
                }
            },
        };
        sent.map_err(|_| SequencerError::Closed)?;
        metrics::record_queue_depth(self.queue_depth());

        let outcome = match deadline_at {
            None => response_rx.await,
            Some(at) => match timeout_at(at, response_rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(SequencerError::Timeout {
                        tx_hash: dispatched_rx.try_recv().ok(),
                    })
                }
            },
        };

        outcome
            .map_err(|_| SequencerError::Closed)?
            .map_err(SequencerError::Chain)
    }

    /// Jobs waiting in the queue, not counting the one in flight.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
