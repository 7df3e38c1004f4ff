//! Transaction sequencing subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → queue.rs (SequencerHandle::enqueue, bounded mpsc + oneshot replies)
//!     → core.rs (single task: send → record pending → confirm → reply)
//!     → pending.rs (hashes broadcast but not yet confirmed)
//! ```
//!
//! # Design Decisions
//! - Exactly one write in flight per signing account
//! - A failed write only fails its own caller
//! - No automatic retries
//! - A caller giving up never cancels a dispatched write

pub mod core;
pub mod pending;
pub mod queue;

pub use self::core::Sequencer;
pub use pending::{PendingTransaction, PendingTransactions};
pub use queue::{SequencerError, SequencerHandle, WriteJob};
