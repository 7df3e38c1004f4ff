//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Wallet + chain client → Sequencer → Listener
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs) → Stop accepting → Finish requests
//!         → Drop sequencer handles → Sequencer drains queue → Exit
//! ```

pub mod signals;

pub use signals::shutdown_signal;
