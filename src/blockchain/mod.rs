//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + [chain] config
//!     → wallet.rs (key loading, redacted signer)
//!     → client.rs (RPC connections with timeouts, contract reads)
//!     → transaction.rs (build, gas/nonce, confirm)
//!     → chain.rs (ChainClient trait consumed by sequencer and gateway)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod chain;
pub mod client;
pub mod contract;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use chain::{ensure_transition, ChainClient, TxStatus};
pub use client::BlockchainClient;
pub use types::{BlockchainConfig, ChainError, ChainId, ChainResult};
pub use wallet::Wallet;
