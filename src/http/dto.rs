//! Request and response bodies of the report gateway.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};

use crate::blockchain::chain::TxStatus;
use crate::reports::types::{BugReport, IntentKind};
use crate::sequencer::PendingTransaction;

/// `POST /api/reports`
///
/// Fields are optional so a missing field is reported as a validation error
/// instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub description: Option<String>,
    pub proof_of_concept: Option<String>,
}

/// `POST /api/reports/{id}/approve`
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub severity: Option<serde_json::Value>,
}

/// Response for every accepted write.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub success: bool,
    pub tx_hash: String,
}

impl WriteResponse {
    pub fn confirmed(tx_hash: TxHash) -> Self {
        Self {
            success: true,
            tx_hash: tx_hash.to_string(),
        }
    }
}

/// A report as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub reporter: String,
    pub description: String,
    pub proof_of_concept: String,
    pub timestamp: String,
    pub severity: Option<u8>,
    pub reward: String,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub is_claimed: bool,
}

impl From<BugReport> for ReportView {
    fn from(report: BugReport) -> Self {
        Self {
            id: report.id.to_string(),
            reporter: report.reporter.to_checksum(None),
            description: report.description,
            proof_of_concept: report.proof_of_concept,
            timestamp: report.timestamp.to_string(),
            severity: report.severity,
            reward: report.reward.to_string(),
            is_approved: report.is_approved,
            is_rejected: report.is_rejected,
            is_claimed: report.is_claimed,
        }
    }
}

/// `GET /api/transactions/{hash}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub tx_hash: String,
    /// `pending`, `confirmed` or `reverted`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueued_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl From<PendingTransaction> for TransactionView {
    fn from(tx: PendingTransaction) -> Self {
        Self {
            tx_hash: tx.tx_hash.to_string(),
            status: "pending",
            intent: Some(tx.intent),
            report_id: tx.report_id.map(|id| id.to_string()),
            enqueued_at: Some(tx.enqueued_at),
            block_number: None,
        }
    }
}

impl TransactionView {
    /// On-chain view of a transaction the registry no longer tracks.
    /// `None` when the node has no receipt.
    pub fn from_status(tx_hash: TxHash, status: TxStatus) -> Option<Self> {
        let (status, block_number) = match status {
            TxStatus::Confirmed { block_number } => ("confirmed", block_number),
            TxStatus::Reverted { block_number } => ("reverted", block_number),
            TxStatus::Unknown => return None,
        };
        Some(Self {
            tx_hash: tx_hash.to_string(),
            status,
            intent: None,
            report_id: None,
            enqueued_at: None,
            block_number: Some(block_number),
        })
    }
}

/// `GET /health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    /// `healthy` or `degraded`.
    pub status: &'static str,
    pub chain_reachable: bool,
    pub queue_depth: usize,
    pub pending_transactions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_reports: Option<usize>,
}
