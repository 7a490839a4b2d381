//! In-process implementation of every store contract.
//!
//! Each operation runs under a single lock, so multi-row inserts are
//! all-or-nothing exactly like their database counterparts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::{
    ApiReport, ApiReportStep, ApiTestCase, ApiTestCaseBlob, ApiTestCaseRecord, BatchSelection,
    EnvironmentConfig, ExecutionQueue, ExecutionQueueDetail,
};
use crate::services::selection::finalize_ids;
use crate::services::store::{
    EnvironmentStore, ExecutionQueueStore, ExecutionSetStore, ReportStore, TestCaseStore,
};

#[derive(Debug, Clone)]
struct QueuedDetail {
    detail: ExecutionQueueDetail,
    claimed: bool,
}

#[derive(Default)]
struct MemoryState {
    test_cases: BTreeMap<String, ApiTestCase>,
    blobs: HashMap<String, ApiTestCaseBlob>,
    environments: HashMap<String, EnvironmentConfig>,
    reports: Vec<ApiReport>,
    records: Vec<ApiTestCaseRecord>,
    steps: Vec<ApiReportStep>,
    step_keys: HashSet<(String, String)>,
    queues: HashMap<String, ExecutionQueue>,
    queue_details: HashMap<String, Vec<QueuedDetail>>,
    sets: HashMap<String, HashSet<String>>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a test case and its request body.
    pub fn put_test_case(&self, test_case: ApiTestCase, request: Option<Vec<u8>>) {
        let mut state = self.state();
        if let Some(request) = request {
            state.blobs.insert(
                test_case.id.clone(),
                ApiTestCaseBlob {
                    id: test_case.id.clone(),
                    request,
                },
            );
        }
        state.test_cases.insert(test_case.id.clone(), test_case);
    }

    /// Delete a test case, as if removed between selection and dispatch.
    pub fn delete_test_case(&self, id: &str) {
        let mut state = self.state();
        state.test_cases.remove(id);
        state.blobs.remove(id);
    }

    pub fn put_environment(&self, environment: EnvironmentConfig) {
        self.state()
            .environments
            .insert(environment.id.clone(), environment);
    }

    pub fn reports(&self) -> Vec<ApiReport> {
        self.state().reports.clone()
    }

    pub fn records(&self) -> Vec<ApiTestCaseRecord> {
        self.state().records.clone()
    }

    /// Steps of one report ordered by sort.
    pub fn steps(&self, report_id: &str) -> Vec<ApiReportStep> {
        let mut steps: Vec<ApiReportStep> = self
            .state()
            .steps
            .iter()
            .filter(|s| s.report_id == report_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.sort);
        steps
    }

    /// All details of a queue, claimed or not, ordered by sort.
    pub fn queue_details(&self, queue_id: &str) -> Vec<ExecutionQueueDetail> {
        self.state()
            .queue_details
            .get(queue_id)
            .map(|details| details.iter().map(|d| d.detail.clone()).collect())
            .unwrap_or_default()
    }

    pub fn queue_ids(&self) -> Vec<String> {
        self.state().queues.keys().cloned().collect()
    }

    pub fn set_items(&self, report_id: &str) -> HashSet<String> {
        self.state()
            .sets
            .get(report_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TestCaseStore for MemoryStore {
    async fn select_ids(
        &self,
        project_id: &str,
        selection: &BatchSelection,
    ) -> AppResult<Vec<String>> {
        let candidates = if selection.select_all {
            let state = self.state();
            let mut cases: Vec<&ApiTestCase> = state
                .test_cases
                .values()
                .filter(|c| c.project_id == project_id)
                .filter(|c| {
                    selection.module_ids.is_empty()
                        || c.module_id
                            .as_ref()
                            .is_some_and(|m| selection.module_ids.contains(m))
                })
                .collect();
            cases.sort_by(|a, b| a.pos.cmp(&b.pos).then_with(|| a.id.cmp(&b.id)));
            cases.into_iter().map(|c| c.id.clone()).collect()
        } else {
            selection.select_ids.clone()
        };
        Ok(finalize_ids(candidates, selection))
    }

    async fn get_test_case(&self, id: &str) -> AppResult<Option<ApiTestCase>> {
        Ok(self.state().test_cases.get(id).cloned())
    }

    async fn get_test_case_blob(&self, id: &str) -> AppResult<Option<ApiTestCaseBlob>> {
        Ok(self.state().blobs.get(id).cloned())
    }

    async fn list_test_cases(&self, ids: &[String]) -> AppResult<Vec<ApiTestCase>> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter_map(|id| state.test_cases.get(id).cloned())
            .collect())
    }

    async fn list_test_case_blobs(&self, ids: &[String]) -> AppResult<Vec<ApiTestCaseBlob>> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter_map(|id| state.blobs.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl EnvironmentStore for MemoryStore {
    async fn get_environment(&self, id: &str) -> AppResult<Option<EnvironmentConfig>> {
        Ok(self.state().environments.get(id).cloned())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_api_reports(
        &self,
        reports: Vec<ApiReport>,
        records: Vec<ApiTestCaseRecord>,
    ) -> AppResult<()> {
        let mut state = self.state();

        // Validate everything before touching state
        let mut new_ids = HashSet::new();
        for report in &reports {
            if !new_ids.insert(report.id.as_str())
                || state.reports.iter().any(|r| r.id == report.id)
            {
                return Err(AppError::Database(format!(
                    "duplicate report id {}",
                    report.id
                )));
            }
        }
        for record in &records {
            if !new_ids.contains(record.api_report_id.as_str()) {
                return Err(AppError::Database(format!(
                    "record references unknown report {}",
                    record.api_report_id
                )));
            }
        }

        state.reports.extend(reports);
        state.records.extend(records);
        Ok(())
    }

    async fn insert_report_steps(&self, steps: Vec<ApiReportStep>) -> AppResult<()> {
        let mut state = self.state();

        let mut new_keys = HashSet::with_capacity(steps.len());
        for step in &steps {
            let key = (step.report_id.clone(), step.step_id.clone());
            if state.step_keys.contains(&key) || !new_keys.insert(key) {
                return Err(AppError::Database(format!(
                    "duplicate step {} in report {}",
                    step.step_id, step.report_id
                )));
            }
        }

        state.step_keys.extend(new_keys);
        state.steps.extend(steps);
        Ok(())
    }
}

#[async_trait]
impl ExecutionQueueStore for MemoryStore {
    async fn insert_queue(
        &self,
        queue: &ExecutionQueue,
        details: Vec<ExecutionQueueDetail>,
    ) -> AppResult<()> {
        let mut state = self.state();
        if state.queues.contains_key(&queue.queue_id) {
            return Err(AppError::Database(format!(
                "duplicate queue id {}",
                queue.queue_id
            )));
        }

        let mut details: Vec<QueuedDetail> = details
            .into_iter()
            .map(|detail| QueuedDetail {
                detail,
                claimed: false,
            })
            .collect();
        details.sort_by_key(|d| d.detail.sort);

        state.queues.insert(queue.queue_id.clone(), queue.clone());
        state.queue_details.insert(queue.queue_id.clone(), details);
        Ok(())
    }

    async fn get_queue(&self, queue_id: &str) -> AppResult<Option<ExecutionQueue>> {
        Ok(self.state().queues.get(queue_id).cloned())
    }

    async fn get_next_detail(&self, queue_id: &str) -> AppResult<Option<ExecutionQueueDetail>> {
        let mut state = self.state();
        let next = state
            .queue_details
            .get_mut(queue_id)
            .and_then(|details| details.iter_mut().find(|d| !d.claimed))
            .map(|d| {
                d.claimed = true;
                d.detail.clone()
            });
        Ok(next)
    }
}

#[async_trait]
impl ExecutionSetStore for MemoryStore {
    async fn init_set(&self, report_id: &str, resource_ids: &[String]) -> AppResult<()> {
        self.state()
            .sets
            .entry(report_id.to_string())
            .or_default()
            .extend(resource_ids.iter().cloned());
        Ok(())
    }

    async fn remove_item(&self, report_id: &str, resource_id: &str) -> AppResult<()> {
        if let Some(set) = self.state().sets.get_mut(report_id) {
            set.remove(resource_id);
        }
        Ok(())
    }
}
