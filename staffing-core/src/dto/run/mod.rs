//! Run DTOs for poller-to-hub communication

use serde::{Deserialize, Serialize};

use crate::domain::run::{ReportStatus, RunSummary};

/// Body of a claim request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Identifies the claiming poller in the hub's records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poller_id: Option<String>,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// Object key of the upload, `None` when uploads are disabled
    pub file_key: Option<String>,
    pub file_name: String,
    pub folder_date: String,
    pub summary: RunSummary,
    pub message: String,
}

/// Body of a complete request
///
/// Successful runs carry the flattened [`RunOutcome`]; failed runs carry
/// the diagnostic text in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRunRequest {
    pub run_id: String,
    pub status: ReportStatus,
    #[serde(flatten)]
    pub outcome: Option<RunOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompleteRunRequest {
    pub fn success(run_id: impl Into<String>, outcome: RunOutcome) -> Self {
        Self {
            run_id: run_id.into(),
            status: ReportStatus::Success,
            outcome: Some(outcome),
            error: None,
        }
    }

    pub fn failure(run_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: ReportStatus::Error,
            outcome: None,
            error: Some(error.into()),
        }
    }
}
