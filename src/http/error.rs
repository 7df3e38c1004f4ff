//! Gateway error taxonomy and its HTTP mapping.
//!
//! Every failure reaching a handler is converted here into a status code and
//! a `{error, code}` JSON body. Nothing is retried.

use alloy::primitives::TxHash;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::types::ChainError;
use crate::sequencer::SequencerError;

/// Errors surfaced by the report gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed input, rejected before reaching the chain.
    #[error("{0}")]
    Validation(String),

    /// Unknown report or transaction.
    #[error("{0}")]
    NotFound(String),

    /// Node rejected or reverted the call, or was unreachable.
    #[error(transparent)]
    Chain(ChainError),

    /// The confirmation wait exceeded the request deadline.
    #[error("{}", request_timeout_message(.tx_hash))]
    RequestTimeout { tx_hash: Option<TxHash> },

    /// The sequencer is not accepting writes.
    #[error("{0}")]
    Unavailable(String),
}

fn request_timeout_message(tx_hash: &Option<TxHash>) -> String {
    match tx_hash {
        Some(hash) => format!(
            "timed out waiting for confirmation of {}; poll /api/transactions/{} for its outcome",
            hash, hash
        ),
        None => "timed out before the transaction was dispatched".to_string(),
    }
}

/// Result type for handlers.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Chain(ChainError::ReportNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RequestTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) | Self::Chain(ChainError::ReportNotFound(_)) => "NOT_FOUND",
            Self::Chain(_) => "CHAIN_ERROR",
            Self::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::RequestTimeout { tx_hash } => *tx_hash,
            _ => None,
        }
    }
}

impl From<ChainError> for GatewayError {
    fn from(e: ChainError) -> Self {
        match e {
            // Broadcast but unconfirmed: the caller can still follow the hash.
            ChainError::ConfirmationTimeout { tx_hash, .. } => Self::RequestTimeout {
                tx_hash: Some(tx_hash),
            },
            e => Self::Chain(e),
        }
    }
}

impl From<SequencerError> for GatewayError {
    fn from(e: SequencerError) -> Self {
        match e {
            SequencerError::Chain(e) => Self::from(e),
            SequencerError::Timeout { tx_hash } => Self::RequestTimeout { tx_hash },
            SequencerError::Closed => Self::Unavailable(e.to_string()),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    pub code: &'static str,
    /// Hash of a transaction that may still confirm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
            tx_hash: self.tx_hash().map(|h| h.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
