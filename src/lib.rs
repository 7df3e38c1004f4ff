//! HTTP gateway for an on-chain bug bounty contract.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reports;
pub mod sequencer;

pub use blockchain::{BlockchainClient, ChainClient};
pub use config::GatewayConfig;
pub use http::{AppState, HttpServer};
pub use sequencer::{Sequencer, SequencerHandle};
