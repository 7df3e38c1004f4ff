//! Bug report domain types.

use std::fmt;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted severity.
pub const MIN_SEVERITY: u8 = 1;
/// Highest accepted severity.
pub const MAX_SEVERITY: u8 = 5;

/// Severity rating assigned on approval, constrained to 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Severity(u8);

/// Rejected severity value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("severity must be an integer between {} and {}, got {}", MIN_SEVERITY, MAX_SEVERITY, .0)]
pub struct InvalidSeverity(pub i64);

impl Severity {
    /// Validate a raw severity.
    pub fn new(value: i64) -> Result<Self, InvalidSeverity> {
        if (MIN_SEVERITY as i64..=MAX_SEVERITY as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidSeverity(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Severity {
    type Error = InvalidSeverity;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lifecycle status of a report, derived from the contract flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
    Claimed,
}

impl ReportStatus {
    /// Derive the status from the on-chain flags.
    ///
    /// Returns `None` for flag combinations the contract must never produce:
    /// approved and rejected together, or claimed without approval.
    pub fn from_flags(is_approved: bool, is_rejected: bool, is_claimed: bool) -> Option<Self> {
        match (is_approved, is_rejected, is_claimed) {
            (false, false, false) => Some(Self::Pending),
            (true, false, false) => Some(Self::Approved),
            (false, true, false) => Some(Self::Rejected),
            (true, false, true) => Some(Self::Claimed),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Claimed)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Claimed => "claimed",
        };
        f.write_str(s)
    }
}

/// A bug report as stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReport {
    pub id: U256,
    pub reporter: Address,
    pub description: String,
    pub proof_of_concept: String,
    /// Submission time, unix seconds.
    pub timestamp: U256,
    /// `None` until approved.
    pub severity: Option<u8>,
    /// Reward in wei.
    pub reward: U256,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub is_claimed: bool,
}

impl BugReport {
    /// Status derived from the flags, `None` when the flags are inconsistent.
    pub fn status(&self) -> Option<ReportStatus> {
        ReportStatus::from_flags(self.is_approved, self.is_rejected, self.is_claimed)
    }
}

/// Kind of on-chain write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Submit,
    Approve,
    Reject,
    Claim,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Claim => "claim",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested contract write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteIntent {
    Submit {
        description: String,
        proof_of_concept: String,
    },
    Approve {
        report_id: U256,
        severity: Severity,
    },
    Reject {
        report_id: U256,
    },
    Claim {
        report_id: U256,
    },
}

impl WriteIntent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Submit { .. } => IntentKind::Submit,
            Self::Approve { .. } => IntentKind::Approve,
            Self::Reject { .. } => IntentKind::Reject,
            Self::Claim { .. } => IntentKind::Claim,
        }
    }

    /// Status the targeted report moves to once this write confirms.
    pub fn target_status(&self) -> ReportStatus {
        match self {
            Self::Submit { .. } => ReportStatus::Pending,
            Self::Approve { .. } => ReportStatus::Approved,
            Self::Reject { .. } => ReportStatus::Rejected,
            Self::Claim { .. } => ReportStatus::Claimed,
        }
    }

    /// The report this write targets. Submits have none: the id is assigned on chain.
    pub fn report_id(&self) -> Option<U256> {
        match self {
            Self::Submit { .. } => None,
            Self::Approve { report_id, .. }
            | Self::Reject { report_id }
            | Self::Claim { report_id } => Some(*report_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bounds() {
        assert!(Severity::new(0).is_err());
        assert_eq!(Severity::new(1).unwrap().get(), 1);
        assert_eq!(Severity::new(5).unwrap().get(), 5);
        let err = Severity::new(6).unwrap_err();
        assert_eq!(err, InvalidSeverity(6));
        assert!(err.to_string().contains("between 1 and 5"));
        assert!(Severity::try_from(-3).is_err());
    }

    #[test]
    fn test_status_from_flags() {
        assert_eq!(ReportStatus::from_flags(false, false, false), Some(ReportStatus::Pending));
        assert_eq!(ReportStatus::from_flags(true, false, false), Some(ReportStatus::Approved));
        assert_eq!(ReportStatus::from_flags(false, true, false), Some(ReportStatus::Rejected));
        assert_eq!(ReportStatus::from_flags(true, false, true), Some(ReportStatus::Claimed));
        // Impossible states
        assert_eq!(ReportStatus::from_flags(true, true, false), None);
        assert_eq!(ReportStatus::from_flags(false, false, true), None);
        assert_eq!(ReportStatus::from_flags(false, true, true), None);
    }

    #[test]
    fn test_transitions_are_monotonic() {
        use ReportStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Claimed));

        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Claimed));
        assert!(!Claimed.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Claimed));
    }

    #[test]
    fn test_intent_report_id() {
        let submit = WriteIntent::Submit {
            description: "d".into(),
            proof_of_concept: "p".into(),
        };
        assert_eq!(submit.kind(), IntentKind::Submit);
        assert_eq!(submit.report_id(), None);

        let claim = WriteIntent::Claim {
            report_id: U256::from(7),
        };
        assert_eq!(claim.kind().to_string(), "claim");
        assert_eq!(claim.report_id(), Some(U256::from(7)));
    }
}
