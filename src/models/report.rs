//! Report domain models: reports, case links and integrated-report steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trigger mode recorded on reports created by a batch run.
pub const TRIGGER_MODE_BATCH: &str = "BATCH";

/// Report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiReportStatus {
    /// Created before dispatch, nothing reported yet.
    Pending,
    Running,
    Success,
    Error,
}

impl ApiReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "RUNNING" => Some(Self::Running),
            "SUCCESS" => Some(Self::Success),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One execution record. The id exists before anything is dispatched against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReport {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub environment_id: Option<String>,
    pub run_mode: String,
    pub status: ApiReportStatus,
    pub integrated: bool,
    pub trigger_mode: String,
    pub pool_id: Option<String>,
    pub create_user: String,
    pub update_user: String,
    pub start_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub deleted: bool,
}

/// Link between a report and a test case it covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiTestCaseRecord {
    pub api_report_id: String,
    pub api_test_case_id: String,
}

/// Ordered entry of an integrated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReportStep {
    pub report_id: String,
    /// Id of the test case this step stands for.
    pub step_id: String,
    pub sort: i64,
    pub name: String,
    pub step_type: String,
}
