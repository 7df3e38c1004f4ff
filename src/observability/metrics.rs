//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bughuntr_http_requests_total` (counter): requests by method, route, status
//! - `bughuntr_http_request_duration_seconds` (histogram): latency distribution
//! - `bughuntr_transactions_total` (counter): writes by intent and outcome
//! - `bughuntr_confirmation_duration_seconds` (histogram): enqueue-to-confirm time
//! - `bughuntr_sequencer_queue_depth` (gauge): writes waiting for their turn
//! - `bughuntr_pending_transactions` (gauge): broadcast, not yet confirmed
//! - `bughuntr_report_cache_size` (gauge): cached reports
//! - `bughuntr_chain_healthy` (gauge): 1=node reachable, 0=unreachable
//!
//! Every recorder call is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::reports::types::IntentKind;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("bughuntr_http_requests_total", &labels).increment(1);
    histogram!("bughuntr_http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_transaction(intent: IntentKind, outcome: &'static str) {
    counter!(
        "bughuntr_transactions_total",
        "intent" => intent.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_confirmation_duration(intent: IntentKind, start: Instant) {
    histogram!("bughuntr_confirmation_duration_seconds", "intent" => intent.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    gauge!("bughuntr_sequencer_queue_depth").set(depth as f64);
}

pub fn record_pending_transactions(count: usize) {
    gauge!("bughuntr_pending_transactions").set(count as f64);
}

pub fn record_cache_size(size: usize) {
    gauge!("bughuntr_report_cache_size").set(size as f64);
}

pub fn record_chain_health(healthy: bool) {
    gauge!("bughuntr_chain_healthy").set(if healthy { 1.0 } else { 0.0 });
}
