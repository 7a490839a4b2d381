//! Domain models for the batch runner.

pub mod queue;
pub mod report;
pub mod run_mode;
pub mod task;

// Re-export commonly used types
pub use queue::{AdvanceOutcome, ExecutionQueue, ExecutionQueueDetail, RESOURCE_TYPE_API_CASE};
pub use report::{ApiReport, ApiReportStatus, ApiReportStep, ApiTestCaseRecord, TRIGGER_MODE_BATCH};
pub use run_mode::{
    BatchRunMode, BatchRunRequest, BatchSelection, CollectionReport, MAX_ID_LEN,
    MAX_REPORT_NAME_LEN, RunModeConfig, RunModeRequest,
};
pub use task::{
    ApiTestCase, ApiTestCaseBlob, EnvironmentConfig, ExecutionDispatch, STEP_TYPE_API_CASE,
    TASK_RUN_MODE_RUN, TaskRequest,
};
