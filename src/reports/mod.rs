//! Bug report domain: types shared by the chain client, the sequencer and
//! the HTTP gateway, plus the optional read-through cache.

pub mod cache;
pub mod types;

pub use cache::ReportCache;
pub use types::{BugReport, IntentKind, InvalidSeverity, ReportStatus, Severity, WriteIntent};
