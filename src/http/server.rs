//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the report gateway routes
//! - Wire up middleware (request ID, tracing, CORS, body limit, metrics)
//! - Serve on a bound listener until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::http::HeaderName;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::blockchain::chain::ChainClient;
use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::observability::metrics;
use crate::reports::cache::ReportCache;
use crate::sequencer::{PendingTransactions, SequencerHandle};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<dyn ChainClient>,
    pub sequencer: SequencerHandle,
    pub pending: PendingTransactions,
    pub cache: Option<ReportCache>,
    /// How long a write request waits for confirmation. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        sequencer: SequencerHandle,
        pending: PendingTransactions,
        cache: Option<ReportCache>,
        request_timeout_secs: u64,
    ) -> Self {
        Self {
            chain,
            sequencer,
            pending,
            cache,
            request_timeout: (request_timeout_secs > 0)
                .then(|| Duration::from_secs(request_timeout_secs)),
        }
    }
}

/// HTTP server for the report gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, state: AppState) -> Self {
        Self {
            router: build_router(config.server.max_body_bytes, state),
        }
    }

    /// Serve on `listener` until `shutdown` resolves, then let in-flight
    /// requests finish.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(max_body_bytes: usize, state: AppState) -> Router {
    let request_id = HeaderName::from_static(X_REQUEST_ID);

    // Every segment after /api/reports/ shares one parameter name, or the
    // route table rejects the overlap.
    Router::new()
        .route("/api/reports", post(handlers::submit_report))
        .route("/api/reports/{id}", get(handlers::list_reports))
        .route("/api/reports/{id}/approve", post(handlers::approve_report))
        .route("/api/reports/{id}/reject", post(handlers::reject_report))
        .route("/api/reports/{id}/claim", post(handlers::claim_reward))
        .route("/api/report/{id}", get(handlers::get_report))
        .route("/api/transactions/{hash}", get(handlers::transaction_status))
        .route("/health", get(handlers::health))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CorsLayer::permissive())
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, TxHash, U256};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::blockchain::chain::TxStatus;
    use crate::blockchain::types::{ChainError, ChainResult};
    use crate::reports::types::{BugReport, WriteIntent};
    use crate::sequencer::Sequencer;

    /// Answers reads with "not found" and fails every write.
    struct EmptyChain;

    #[async_trait]
    impl ChainClient for EmptyChain {
        async fn send(&self, _intent: &WriteIntent) -> ChainResult<TxHash> {
            Err(ChainError::Rpc("read-only".into()))
        }

        async fn confirm(&self, _tx_hash: TxHash) -> ChainResult<u64> {
            Err(ChainError::Rpc("read-only".into()))
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

    fn router(max_body_bytes: usize) -> Router {
        let chain: Arc<dyn ChainClient> = Arc::new(EmptyChain);
        let pending = PendingTransactions::new();
        let (sequencer, handle) = Sequencer::new(chain.clone(), 8, pending.clone(), None);
        tokio::spawn(sequencer.run());
        build_router(max_body_bytes, AppState::new(chain, handle, pending, None, 5))
    }

    fn request(method: Method, uri: &str, body: Body) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router(1024)
            .oneshot(request(Method::GET, "/api/nothing", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = format!(r#"{{"description":"{}","proofOfConcept":"x"}}"#, "a".repeat(256));
        let mut req = request(Method::POST, "/api/reports", Body::empty());
        req.headers_mut()
            .insert("content-length", body.len().to_string().parse().unwrap());
        *req.body_mut() = Body::from(body);

        let response = router(64).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_write_failure_maps_to_chain_error() {
        let response = router(1024)
            .oneshot(request(
                Method::POST,
                "/api/reports",
                Body::from(r#"{"description":"d","proofOfConcept":"p"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "RPC error: read-only");
        assert_eq!(json["code"], "CHAIN_ERROR");
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = router(1024)
            .oneshot(request(Method::GET, "/health", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let chain: Arc<dyn ChainClient> = Arc::new(EmptyChain);
        let pending = PendingTransactions::new();
        let (_sequencer, handle) = Sequencer::new(chain.clone(), 1, pending.clone(), None);

        let state = AppState::new(chain.clone(), handle.clone(), pending.clone(), None, 0);
        assert!(state.request_timeout.is_none());

        let state = AppState::new(chain, handle, pending, None, 60);
        assert_eq!(state.request_timeout, Some(Duration::from_secs(60)));
    }
}
