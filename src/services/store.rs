//! Collaborator contracts used by the batch orchestrator.
//!
//! `DbPool` implements every store against PostgreSQL; `MemoryStore` keeps
//! the same contracts in process.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    ApiReport, ApiReportStep, ApiTestCase, ApiTestCaseBlob, ApiTestCaseRecord, BatchSelection,
    EnvironmentConfig, ExecutionDispatch, ExecutionQueue, ExecutionQueueDetail,
};

/// Resource selection and test case loading.
#[async_trait]
pub trait TestCaseStore: Send + Sync {
    /// Resolve a selection to an ordered, duplicate-free id list.
    async fn select_ids(&self, project_id: &str, selection: &BatchSelection)
    -> AppResult<Vec<String>>;

    async fn get_test_case(&self, id: &str) -> AppResult<Option<ApiTestCase>>;

    async fn get_test_case_blob(&self, id: &str) -> AppResult<Option<ApiTestCaseBlob>>;

    /// Bulk load active test cases. Missing ids are simply absent.
    async fn list_test_cases(&self, ids: &[String]) -> AppResult<Vec<ApiTestCase>>;

    async fn list_test_case_blobs(&self, ids: &[String]) -> AppResult<Vec<ApiTestCaseBlob>>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    async fn get_environment(&self, id: &str) -> AppResult<Option<EnvironmentConfig>>;
}

/// Report persistence. Each call is one atomic unit.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert reports together with their case links.
    async fn insert_api_reports(
        &self,
        reports: Vec<ApiReport>,
        records: Vec<ApiTestCaseRecord>,
    ) -> AppResult<()>;

    async fn insert_report_steps(&self, steps: Vec<ApiReportStep>) -> AppResult<()>;
}

/// Durable FIFO of serial batch work.
#[async_trait]
pub trait ExecutionQueueStore: Send + Sync {
    /// Create the queue header and all of its details atomically.
    async fn insert_queue(
        &self,
        queue: &ExecutionQueue,
        details: Vec<ExecutionQueueDetail>,
    ) -> AppResult<()>;

    async fn get_queue(&self, queue_id: &str) -> AppResult<Option<ExecutionQueue>>;

    /// Claim the unclaimed detail with the lowest sort. A claimed detail is
    /// never returned again, including after a process restart.
    async fn get_next_detail(&self, queue_id: &str) -> AppResult<Option<ExecutionQueueDetail>>;
}

/// Membership of resources still pending for an integrated report.
#[async_trait]
pub trait ExecutionSetStore: Send + Sync {
    async fn init_set(&self, report_id: &str, resource_ids: &[String]) -> AppResult<()>;

    async fn remove_item(&self, report_id: &str, resource_id: &str) -> AppResult<()>;
}

/// Runs one test case and writes its outcome against `task.report_id`.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn submit(&self, dispatch: ExecutionDispatch) -> AppResult<()>;

    /// Where submissions go, if the engine is remote.
    fn endpoint(&self) -> Option<&str> {
        None
    }
}

/// Globally unique string ids for reports, queues and integrated sub-reports.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Time-ordered UUIDv7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::now_v7().to_string()
    }
}

/// The stores the orchestrator works against.
#[derive(Clone)]
pub struct Stores {
    pub test_cases: Arc<dyn TestCaseStore>,
    pub environments: Arc<dyn EnvironmentStore>,
    pub reports: Arc<dyn ReportStore>,
    pub queues: Arc<dyn ExecutionQueueStore>,
    pub sets: Arc<dyn ExecutionSetStore>,
}

impl Stores {
    /// Use one backend for every store.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: TestCaseStore
            + EnvironmentStore
            + ReportStore
            + ExecutionQueueStore
            + ExecutionSetStore
            + 'static,
    {
        Self {
            test_cases: store.clone(),
            environments: store.clone(),
            reports: store.clone(),
            queues: store.clone(),
            sets: store,
        }
    }
}
