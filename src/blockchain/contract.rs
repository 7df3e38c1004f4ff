//! ABI bindings for the bug bounty contract.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::{ChainError, ChainResult};
use crate::reports::types::{BugReport, WriteIntent};

sol! {
    #[derive(Debug)]
    interface IBugHuntr {
        function submitBugReport(string description, string proofOfConcept) external;
        function approveBugReport(uint256 reportId, uint8 severity) external;
        function rejectBugReport(uint256 reportId) external;
        function claimReward(uint256 reportId) external;

        function getUserReports(address user) external view returns (uint256[] memory);
        function getBugReport(uint256 reportId)
            external
            view
            returns (
                address reporter,
                string description,
                string proofOfConcept,
                uint256 timestamp,
                uint8 severity,
                uint256 reward,
                bool isApproved,
                bool isRejected,
                bool isClaimed
            );
    }
}

/// Calldata for a write.
pub fn encode_write(intent: &WriteIntent) -> Bytes {
    let data = match intent {
        WriteIntent::Submit {
            description,
            proof_of_concept,
        } => IBugHuntr::submitBugReportCall {
            description: description.clone(),
            proofOfConcept: proof_of_concept.clone(),
        }
        .abi_encode(),
        WriteIntent::Approve {
            report_id,
            severity,
        } => IBugHuntr::approveBugReportCall {
            reportId: *report_id,
            severity: severity.get(),
        }
        .abi_encode(),
        WriteIntent::Reject { report_id } => IBugHuntr::rejectBugReportCall {
            reportId: *report_id,
        }
        .abi_encode(),
        WriteIntent::Claim { report_id } => IBugHuntr::claimRewardCall {
            reportId: *report_id,
        }
        .abi_encode(),
    };
    Bytes::from(data)
}

pub fn encode_get_user_reports(user: Address) -> Bytes {
    Bytes::from(IBugHuntr::getUserReportsCall { user }.abi_encode())
}

pub fn encode_get_bug_report(report_id: U256) -> Bytes {
    Bytes::from(IBugHuntr::getBugReportCall { reportId: report_id }.abi_encode())
}

pub fn decode_user_reports(data: &[u8]) -> ChainResult<Vec<U256>> {
    IBugHuntr::getUserReportsCall::abi_decode_returns(data)
        .map_err(|e| ChainError::Abi(format!("getUserReports: {}", e)))
}

/// Decode `getBugReport` output.
///
/// The contract answers unknown ids with a zeroed struct, so a zero reporter
/// means the report does not exist.
pub fn decode_bug_report(report_id: U256, data: &[u8]) -> ChainResult<BugReport> {
    let ret = IBugHuntr::getBugReportCall::abi_decode_returns(data)
        .map_err(|e| ChainError::Abi(format!("getBugReport: {}", e)))?;

    if ret.reporter == Address::ZERO {
        return Err(ChainError::ReportNotFound(report_id));
    }

    let report = BugReport {
        id: report_id,
        reporter: ret.reporter,
        description: ret.description,
        proof_of_concept: ret.proofOfConcept,
        timestamp: ret.timestamp,
        severity: (ret.severity != 0).then_some(ret.severity),
        reward: ret.reward,
        is_approved: ret.isApproved,
        is_rejected: ret.isRejected,
        is_claimed: ret.isClaimed,
    };

    if report.status().is_none() {
        return Err(ChainError::InconsistentReport(report_id));
    }
    Ok(report)
}
