//! Run domain types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A scrape run handed out by the hub's claim endpoint
///
/// The hub treats the descriptor as opaque. Only `runId` and the optional
/// `folderDate` are interpreted here; everything else is kept in
/// `parameters` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunClaim {
    #[serde(default, deserialize_with = "deserialize_run_id")]
    pub run_id: Option<String>,

    /// Upload date override (`YYYY-MM-DD`)
    #[serde(
        default,
        deserialize_with = "deserialize_folder_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub folder_date: Option<String>,

    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl RunClaim {
    /// Creates a claim carrying only a run identifier
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            folder_date: None,
            parameters: Map::new(),
        }
    }

    /// Returns the run identifier, if the hub sent a usable one
    pub fn run_id(&self) -> Option<&str> {
        self.run_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Accepts `runId` as either a JSON string or a number.
fn deserialize_run_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Accepts any JSON value for `folderDate`; non-strings are kept as their
/// JSON text so the run can still be reported with a date error.
fn deserialize_folder_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(date)) => Some(date),
        Some(other) => Some(other.to_string()),
    })
}

/// Server-side lifecycle of a run
///
/// Runs only ever move forward: `Claimed -> Running -> Completed | Error`.
/// `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Claimed,
    Running,
    Completed,
    Error,
}

impl RunStatus {
    fn rank(self) -> u8 {
        match self {
            RunStatus::Claimed => 0,
            RunStatus::Running => 1,
            RunStatus::Completed | RunStatus::Error => 2,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Error)
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Claimed => write!(f, "claimed"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// Status value sent to the complete endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Error,
}

impl ReportStatus {
    /// The run status the hub records for this report
    pub fn run_status(self) -> RunStatus {
        match self {
            ReportStatus::Success => RunStatus::Completed,
            ReportStatus::Error => RunStatus::Error,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "success"),
            ReportStatus::Error => write!(f, "error"),
        }
    }
}

/// Row statistics attached to a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Data rows in the export, header excluded
    pub total_rows: u64,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
