//! Report gateway handlers.
//!
//! Input is validated here before anything reaches the sequencer, so a
//! malformed request never dispatches a transaction.

use std::str::FromStr;

use alloy::primitives::{Address, TxHash, U256};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::try_join_all;

use crate::http::dto::{
    ApproveRequest, HealthView, ReportView, SubmitRequest, TransactionView, WriteResponse,
};
use crate::http::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::reports::types::{BugReport, Severity, WriteIntent};

/// `POST /api/reports`
pub async fn submit_report(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> GatewayResult<Json<WriteResponse>> {
    let Json(req) = payload?;
    let description = required_text("description", req.description)?;
    let proof_of_concept = required_text("proofOfConcept", req.proof_of_concept)?;

    dispatch(
        &state,
        WriteIntent::Submit {
            description,
            proof_of_concept,
        },
    )
    .await
}

/// `GET /api/reports/{address}`
pub async fn list_reports(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> GatewayResult<Json<Vec<ReportView>>> {
    let reporter = parse_address(&address)?;
    let ids = state.chain.get_user_reports(reporter).await?;

    tracing::debug!(reporter = %reporter, count = ids.len(), "Resolving reports");

    let reports = try_join_all(ids.into_iter().map(|id| load_report(&state, id))).await?;
    Ok(Json(reports.into_iter().map(ReportView::from).collect()))
}

/// `GET /api/report/{id}`
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> GatewayResult<Json<ReportView>> {
    let report_id = parse_report_id(&id)?;
    let report = load_report(&state, report_id).await?;
    Ok(Json(report.into()))
}

/// `POST /api/reports/{id}/approve`
pub async fn approve_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ApproveRequest>, JsonRejection>,
) -> GatewayResult<Json<WriteResponse>> {
    let report_id = parse_report_id(&id)?;
    let Json(req) = payload?;
    let severity = parse_severity(req.severity)?;

    dispatch(
        &state,
        WriteIntent::Approve {
            report_id,
            severity,
        },
    )
    .await
}

/// `POST /api/reports/{id}/reject`
pub async fn reject_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> GatewayResult<Json<WriteResponse>> {
    let report_id = parse_report_id(&id)?;
    dispatch(&state, WriteIntent::Reject { report_id }).await
}

/// `POST /api/reports/{id}/claim`
pub async fn claim_reward(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> GatewayResult<Json<WriteResponse>> {
    let report_id = parse_report_id(&id)?;
    dispatch(&state, WriteIntent::Claim { report_id }).await
}

/// `GET /api/transactions/{hash}`
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> GatewayResult<Json<TransactionView>> {
    let tx_hash = TxHash::from_str(&hash)
        .map_err(|_| GatewayError::Validation(format!("invalid transaction hash: {}", hash)))?;

    if let Some(pending) = state.pending.get(&tx_hash) {
        return Ok(Json(pending.into()));
    }

    let status = state.chain.transaction_status(tx_hash).await?;
    TransactionView::from_status(tx_hash, status)
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("transaction {} not found", tx_hash)))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let chain_reachable = state.chain.is_healthy().await;
    let view = HealthView {
        status: if chain_reachable { "healthy" } else { "degraded" },
        chain_reachable,
        queue_depth: state.sequencer.queue_depth(),
        pending_transactions: state.pending.len(),
        cached_reports: state.cache.as_ref().map(|c| c.len()),
    };

    let status = if chain_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(view)).into_response()
}

async fn dispatch(state: &AppState, intent: WriteIntent) -> GatewayResult<Json<WriteResponse>> {
    let kind = intent.kind();
    let tx_hash = state
        .sequencer
        .enqueue_with_deadline(intent, state.request_timeout)
        .await?;

    tracing::info!(intent = %kind, tx_hash = %tx_hash, "Write confirmed");
    Ok(Json(WriteResponse::confirmed(tx_hash)))
}

/// Read a report, through the cache when one is configured.
async fn load_report(state: &AppState, id: U256) -> GatewayResult<BugReport> {
    let Some(cache) = &state.cache else {
        return Ok(state.chain.get_report(id).await?);
    };
    if let Some(report) = cache.get(&id) {
        return Ok(report);
    }

    let epoch = cache.epoch();
    let report = state.chain.get_report(id).await?;
    cache.insert(report.clone(), epoch);
    Ok(report)
}

fn required_text(field: &str, value: Option<String>) -> GatewayResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GatewayError::Validation(format!(
            "{} is required and must be a non-empty string",
            field
        ))),
    }
}

/// Decimal uint256 report id.
pub(crate) fn parse_report_id(raw: &str) -> GatewayResult<U256> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::Validation(format!("invalid report id: {}", raw)));
    }
    U256::from_str_radix(raw, 10)
        .map_err(|_| GatewayError::Validation(format!("report id out of range: {}", raw)))
}

/// `0x`-prefixed 20-byte hex address, any letter case.
pub(crate) fn parse_address(raw: &str) -> GatewayResult<Address> {
    let invalid = || GatewayError::Validation(format!("invalid address: {}", raw));
    let hex = raw.strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    Address::from_str(raw).map_err(|_| invalid())
}

pub(crate) fn parse_severity(raw: Option<serde_json::Value>) -> GatewayResult<Severity> {
    let value = raw.ok_or_else(|| GatewayError::Validation("severity is required".into()))?;
    let number = value.as_i64().ok_or_else(|| {
        GatewayError::Validation(format!("severity must be an integer, got {}", value))
    })?;
    Severity::new(number).map_err(|e| GatewayError::Validation(e.to_string()))
}
