//! The contract-facing seam used by the sequencer and the HTTP gateway.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::types::{ChainError, ChainResult};
use crate::reports::types::{BugReport, Severity, WriteIntent};

/// On-chain state of a transaction that is no longer tracked locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Mined with success status.
    Confirmed { block_number: u64 },
    /// Mined but execution reverted.
    Reverted { block_number: u64 },
    /// No receipt yet, or the node never saw it.
    Unknown,
}

/// Refuse a write that the report's current status does not allow, before
/// anything is signed.
pub fn ensure_transition(report: &BugReport, intent: &WriteIntent) -> ChainResult<()> {
    let status = report
        .status()
        .ok_or(ChainError::InconsistentReport(report.id))?;
    if status.can_transition_to(intent.target_status()) {
        return Ok(());
    }
    Err(ChainError::InvalidTransition {
        report_id: report.id,
        intent: intent.kind(),
        status,
    })
}

/// Typed access to the bug bounty contract through one signing account.
///
/// Writes are split into [`send`](Self::send) and [`confirm`](Self::confirm)
/// so the sequencer can record the hash between broadcast and confirmation.
/// The typed helpers do both and suspend until the write is confirmed.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Build, sign and broadcast a write. Returns once the node accepted it.
    ///
    /// Writes targeting a report fail with `ReportNotFound` when the id is unknown.
    async fn send(&self, intent: &WriteIntent) -> ChainResult<TxHash>;

    /// Wait until the transaction is confirmed. Returns the inclusion block.
    async fn confirm(&self, tx_hash: TxHash) -> ChainResult<u64>;

    /// Read a report from the latest state.
    async fn get_report(&self, report_id: U256) -> ChainResult<BugReport>;

    /// Report ids submitted by `reporter`, in contract order.
    async fn get_user_reports(&self, reporter: Address) -> ChainResult<Vec<U256>>;

    /// Look up a transaction's receipt.
    async fn transaction_status(&self, tx_hash: TxHash) -> ChainResult<TxStatus>;

    /// Whether the node answers at all.
    async fn is_healthy(&self) -> bool;

    async fn submit(&self, description: String, proof_of_concept: String) -> ChainResult<TxHash> {
        self.write(WriteIntent::Submit {
            description,
            proof_of_concept,
        })
        .await
    }

    async fn approve(&self, report_id: U256, severity: Severity) -> ChainResult<TxHash> {
        self.write(WriteIntent::Approve {
            report_id,
            severity,
        })
        .await
    }

    async fn reject(&self, report_id: U256) -> ChainResult<TxHash> {
        self.write(WriteIntent::Reject { report_id }).await
    }

    async fn claim(&self, report_id: U256) -> ChainResult<TxHash> {
        self.write(WriteIntent::Claim { report_id }).await
    }

    /// Send then confirm.
    async fn write(&self, intent: WriteIntent) -> ChainResult<TxHash> {
        let tx_hash = self.send(&intent).await?;
        self.confirm(tx_hash).await?;
        Ok(tx_hash)
    }
}
