//! Batch run request and run-mode configuration models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest id the store accepts (project, case, environment and pool ids).
pub const MAX_ID_LEN: usize = 64;

/// Longest report name the store accepts.
pub const MAX_REPORT_NAME_LEN: usize = 255;

/// How the resources of one batch are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchRunMode {
    /// One resource at a time, advanced by completion signals.
    #[default]
    Serial,
    /// Chunked, with chunks processed concurrently.
    Parallel,
}

impl BatchRunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "SERIAL",
            Self::Parallel => "PARALLEL",
        }
    }
}

impl std::fmt::Display for BatchRunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run-mode fields as submitted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RunModeRequest {
    #[serde(default)]
    pub run_mode: BatchRunMode,
    /// Environment that overrides each test case's own environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// Aggregate every test case into one report.
    #[serde(default)]
    pub integrated_report: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrated_report_name: Option<String>,
    /// Resource pool the execution engine should run on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
}

/// Integrated ("collection") report settings attached to a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub report_name: String,
    /// Filled in once the integrated report has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

/// Execution policy carried by a batch, its queue and every task request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunModeConfig {
    pub run_mode: BatchRunMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(default)]
    pub integrated_report: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_report: Option<CollectionReport>,
}

impl RunModeConfig {
    /// Copy the caller's run-mode fields, attaching a collection report when a
    /// non-blank integrated report name was supplied. The name is kept as given.
    pub fn derive(request: &RunModeRequest) -> Self {
        let collection_report = request
            .integrated_report_name
            .as_deref()
            .filter(|name| request.integrated_report && !name.trim().is_empty())
            .map(|name| CollectionReport {
                report_name: name.to_string(),
                report_id: None,
            });

        Self {
            run_mode: request.run_mode,
            environment_id: request.environment_id.clone(),
            integrated_report: request.integrated_report,
            pool_id: request.pool_id.clone(),
            collection_report,
        }
    }

    pub fn is_integrated_report(&self) -> bool {
        self.integrated_report
    }

    /// Explicit environment override, ignoring blank values.
    pub fn environment_override(&self) -> Option<&str> {
        self.environment_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Id of the integrated report, once created.
    pub fn integrated_report_id(&self) -> Option<&str> {
        self.collection_report
            .as_ref()
            .and_then(|c| c.report_id.as_deref())
    }
}

/// Which test cases a batch targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchSelection {
    /// Explicit ids, executed in the given order.
    #[serde(default)]
    pub select_ids: Vec<String>,
    /// Select every active test case of the project instead of `select_ids`.
    #[serde(default)]
    pub select_all: bool,
    /// Ids removed from the selection.
    #[serde(default)]
    pub exclude_ids: Vec<String>,
    /// Restrict `select_all` to these modules.
    #[serde(default)]
    pub module_ids: Vec<String>,
}

/// A batch run submitted by a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchRunRequest {
    pub project_id: String,
    #[serde(flatten)]
    pub selection: BatchSelection,
    pub run_mode_config: RunModeRequest,
}

impl BatchRunRequest {
    /// Reject requests the orchestrator cannot act on.
    pub fn validate(&self) -> Result<(), String> {
        if self.project_id.trim().is_empty() {
            return Err("project_id is required".to_string());
        }
        if !self.selection.select_all && self.selection.select_ids.is_empty() {
            return Err("select_ids must not be empty unless select_all is set".to_string());
        }
        let cfg = &self.run_mode_config;
        if cfg.integrated_report
            && cfg
                .integrated_report_name
                .as_deref()
                .is_none_or(|n| n.trim().is_empty())
        {
            return Err("integrated_report_name is required for integrated reports".to_string());
        }
        if let Some(name) = &cfg.integrated_report_name
            && name.chars().count() > MAX_REPORT_NAME_LEN
        {
            return Err(format!(
                "integrated_report_name must be at most {} characters",
                MAX_REPORT_NAME_LEN
            ));
        }

        check_id("project_id", &self.project_id)?;
        for (field, value) in [
            ("environment_id", &cfg.environment_id),
            ("pool_id", &cfg.pool_id),
        ] {
            if let Some(value) = value {
                check_id(field, value)?;
            }
        }
        for (field, values) in [
            ("select_ids", &self.selection.select_ids),
            ("exclude_ids", &self.selection.exclude_ids),
            ("module_ids", &self.selection.module_ids),
        ] {
            for value in values {
                check_id(field, value)?;
            }
        }
        Ok(())
    }
}

fn check_id(field: &str, value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_ID_LEN {
        return Err(format!(
            "{} values must be at most {} characters",
            field, MAX_ID_LEN
        ));
    }
    Ok(())
}
