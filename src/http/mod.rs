//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing, limits, metrics)
//!     → handlers.rs (validate input)
//!         reads  → ChainClient (through the report cache)
//!         writes → SequencerHandle (wait for confirmation or deadline)
//!     → dto.rs (JSON bodies)
//!     → error.rs (failures → status + {error, code})
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use server::{build_router, AppState, HttpServer, X_REQUEST_ID};
