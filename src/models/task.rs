//! Test case data and the task payloads handed to the execution engine.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::RunModeConfig;

/// Run mode tag sent with every batch task.
pub const TASK_RUN_MODE_RUN: &str = "RUN";

/// Step type of integrated report steps created for API test cases.
pub const STEP_TYPE_API_CASE: &str = "API_CASE";

/// An API test case as needed for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTestCase {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub module_id: Option<String>,
    /// The test case's own default environment.
    pub environment_id: Option<String>,
    pub pos: i64,
}

/// Serialized request definition of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTestCaseBlob {
    pub id: String,
    pub request: Vec<u8>,
}

impl ApiTestCaseBlob {
    /// Decode the stored request definition.
    pub fn request_json(&self) -> serde_json::Result<JsonValue> {
        serde_json::from_slice(&self.request)
    }
}

/// Stored environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub id: String,
    pub name: String,
    pub config: JsonValue,
}

/// Task request the execution engine runs and reports back against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Report the engine writes its result to.
    pub report_id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub project_id: String,
    pub run_mode: String,
    pub save_result: bool,
    pub real_time: bool,
    pub run_mode_config: RunModeConfig,
    /// Serial batches only; lets the engine ask for the next queue entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
}

/// Everything the execution engine receives for one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDispatch {
    pub task: TaskRequest,
    pub test_case: ApiTestCase,
    pub request: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentConfig>,
}
