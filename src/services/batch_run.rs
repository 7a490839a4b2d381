//! Batch run orchestration.
//!
//! A batch resolves its selection to an ordered id list once. That list is the
//! only ordering source: queue detail sorts and integrated report step sorts
//! are both positions in it.
//!
//! Serial batches persist an execution queue and dispatch its first entry;
//! every following entry is dispatched through [`BatchRunService::advance`]
//! once the engine reports the previous task complete. Parallel batches split
//! the list into chunks and process chunks concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::BatchRunSettings;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdvanceOutcome, ApiTestCase, ApiTestCaseBlob, BatchRunMode, BatchRunRequest, ExecutionDispatch,
    ExecutionQueue, ExecutionQueueDetail, RESOURCE_TYPE_API_CASE, RunModeConfig,
    TASK_RUN_MODE_RUN, TaskRequest,
};
use crate::services::environment::resolve_environment_id;
use crate::services::report_builder::{ReportBuilder, report_step};
use crate::services::store::{ExecutionEngine, IdGenerator, Stores};

/// Failure counter shared by every chunk of one parallel batch.
#[derive(Debug)]
pub struct FailureBrake {
    failures: AtomicUsize,
    threshold: usize,
}

impl FailureBrake {
    pub fn new(threshold: usize) -> Self {
        Self {
            failures: AtomicUsize::new(0),
            threshold,
        }
    }

    /// Count one failure. Returns true once the count exceeds the threshold.
    pub fn record_failure(&self) -> bool {
        self.failures.fetch_add(1, Ordering::SeqCst) + 1 > self.threshold
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

/// Where a chunk's tasks report to.
enum ChunkReports {
    /// Every task gets a fresh sub-report id under one integrated report.
    Integrated { report_id: String },
    /// Pre-created report per test case id.
    PerCase(HashMap<String, String>),
}

/// Orchestrates batch runs of API test cases.
#[derive(Clone)]
pub struct BatchRunService {
    stores: Stores,
    reports: ReportBuilder,
    engine: Arc<dyn ExecutionEngine>,
    ids: Arc<dyn IdGenerator>,
    settings: BatchRunSettings,
}

impl BatchRunService {
    pub fn new(
        stores: Stores,
        engine: Arc<dyn ExecutionEngine>,
        ids: Arc<dyn IdGenerator>,
        settings: BatchRunSettings,
    ) -> Self {
        let reports = ReportBuilder::new(stores.reports.clone(), ids.clone());
        Self {
            stores,
            reports,
            engine,
            ids,
            settings,
        }
    }

    /// Check the stores are reachable. Returns the engine endpoint tasks are
    /// submitted to.
    pub async fn check_ready(&self) -> AppResult<Option<String>> {
        self.stores.test_cases.ping().await?;
        Ok(self.engine.endpoint().map(str::to_string))
    }

    /// Start a batch in the background and return immediately.
    pub fn async_batch_run(&self, request: BatchRunRequest, user_id: String) {
        let service = self.clone();
        tokio::spawn(async move {
            service.batch_run(&request, &user_id).await;
        });
    }

    /// Run a batch to the point where it no longer needs the caller. Errors
    /// are logged, never returned.
    pub async fn batch_run(&self, request: &BatchRunRequest, user_id: &str) {
        let run_mode = request.run_mode_config.run_mode;
        let result = match run_mode {
            BatchRunMode::Parallel => self.parallel_execute(request, user_id).await,
            BatchRunMode::Serial => self.serial_execute(request, user_id).await,
        };

        if let Err(e) = result {
            error!(
                project_id = %request.project_id,
                run_mode = %run_mode,
                user_id = %user_id,
                error = %e,
                "Batch run failed"
            );
        }
    }

    /// Persist the batch as an execution queue and dispatch its first entry.
    pub async fn serial_execute(&self, request: &BatchRunRequest, user_id: &str) -> AppResult<()> {
        let ids = self.resolve_ids(request).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut run_mode_config = RunModeConfig::derive(&request.run_mode_config);
        if run_mode_config.is_integrated_report() {
            self.reports
                .create_integrated_report(&mut run_mode_config, &ids, user_id, &request.project_id)
                .await?;
        }

        let queue = self
            .init_execution_queue(&ids, run_mode_config, user_id)
            .await?;
        info!(
            queue_id = %queue.queue_id,
            cases = ids.len(),
            "Serial batch queued"
        );

        match self.stores.queues.get_next_detail(&queue.queue_id).await? {
            Some(detail) => {
                self.execute_next_task(&queue, &detail).await?;
            }
            None => warn!(queue_id = %queue.queue_id, "New execution queue has no entries"),
        }
        Ok(())
    }

    /// Dispatch every selected test case, chunk by chunk.
    pub async fn parallel_execute(
        &self,
        request: &BatchRunRequest,
        user_id: &str,
    ) -> AppResult<()> {
        let ids = self.resolve_ids(request).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut run_mode_config = RunModeConfig::derive(&request.run_mode_config);
        if run_mode_config.is_integrated_report() {
            let report = self
                .reports
                .create_integrated_report(&mut run_mode_config, &ids, user_id, &request.project_id)
                .await?;
            self.stores.sets.init_set(&report.id, &ids).await?;
        }

        let brake = FailureBrake::new(self.settings.failure_threshold);
        let chunk_size = self.settings.chunk_size.max(1);
        let parallelism = self.settings.parallelism.max(1);
        let run_mode_config = &run_mode_config;
        let brake = &brake;

        let chunks: Vec<(usize, Vec<String>)> = ids
            .chunks(chunk_size)
            .map(<[String]>::to_vec)
            .enumerate()
            .collect();

        stream::iter(chunks)
            .for_each_concurrent(parallelism, |(index, chunk)| async move {
                let offset = index * chunk_size;
                if let Err(e) = self
                    .execute_chunk(run_mode_config, offset, &chunk, user_id, brake)
                    .await
                {
                    error!(chunk = index, error = %e, "Failed to process chunk");
                }
            })
            .await;

        info!(
            cases = ids.len(),
            failures = brake.failures(),
            "Parallel batch dispatched"
        );
        Ok(())
    }

    /// Claim and dispatch the next entry of a serial queue.
    pub async fn advance(&self, queue_id: &str) -> AppResult<AdvanceOutcome> {
        let queue = self
            .stores
            .queues
            .get_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Execution queue {}", queue_id)))?;

        let Some(detail) = self.stores.queues.get_next_detail(queue_id).await? else {
            info!(queue_id = %queue_id, "Execution queue drained");
            return Ok(AdvanceOutcome::Drained);
        };

        let outcome = if self.execute_next_task(&queue, &detail).await? {
            AdvanceOutcome::Dispatched {
                resource_id: detail.resource_id,
                sort: detail.sort,
            }
        } else {
            AdvanceOutcome::Skipped {
                resource_id: detail.resource_id,
                sort: detail.sort,
            }
        };
        Ok(outcome)
    }

    /// Dispatch one claimed queue entry. Returns false when its test case no
    /// longer exists; nothing is dispatched then.
    pub async fn execute_next_task(
        &self,
        queue: &ExecutionQueue,
        detail: &ExecutionQueueDetail,
    ) -> AppResult<bool> {
        let run_mode_config = &queue.run_mode_config;
        let Some(test_case) = self
            .stores
            .test_cases
            .get_test_case(&detail.resource_id)
            .await?
        else {
            info!(
                queue_id = %queue.queue_id,
                resource_id = %detail.resource_id,
                sort = detail.sort,
                "Test case no longer exists, nothing dispatched"
            );
            return Ok(false);
        };
        let blob = self
            .stores
            .test_cases
            .get_test_case_blob(&detail.resource_id)
            .await?;

        let report_id = if run_mode_config.is_integrated_report() {
            let integrated_report_id = run_mode_config.integrated_report_id().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Execution queue {} has no integrated report",
                    queue.queue_id
                ))
            })?;
            self.reports
                .insert_steps(vec![report_step(
                    integrated_report_id,
                    &test_case.id,
                    Some(&test_case),
                    detail.sort,
                )])
                .await?;
            self.ids.next_id()
        } else {
            self.reports
                .create_per_resource_reports(run_mode_config, &[&test_case], &queue.user_id)
                .await?
                .into_iter()
                .next()
                .map(|record| record.api_report_id)
                .ok_or_else(|| {
                    AppError::Database(format!("No report created for {}", test_case.id))
                })?
        };

        let mut task = task_request(report_id, &test_case, run_mode_config);
        task.queue_id = Some(queue.queue_id.clone());
        self.dispatch(task, &test_case, blob.as_ref()).await?;
        Ok(true)
    }

    async fn resolve_ids(&self, request: &BatchRunRequest) -> AppResult<Vec<String>> {
        let ids = self
            .stores
            .test_cases
            .select_ids(&request.project_id, &request.selection)
            .await?;

        if ids.is_empty() {
            info!(project_id = %request.project_id, "No test cases selected, nothing to run");
        } else {
            debug!(project_id = %request.project_id, cases = ids.len(), "Resolved batch selection");
        }
        Ok(ids)
    }

    async fn init_execution_queue(
        &self,
        ids: &[String],
        run_mode_config: RunModeConfig,
        user_id: &str,
    ) -> AppResult<ExecutionQueue> {
        let queue = ExecutionQueue {
            queue_id: self.ids.next_id(),
            run_mode_config,
            user_id: user_id.to_string(),
            create_time: Utc::now(),
        };
        let details = ExecutionQueueDetail::for_resources(&queue.queue_id, ids);
        self.stores.queues.insert_queue(&queue, details).await?;
        Ok(queue)
    }

    /// Process one chunk. `offset` is the position of its first id in the
    /// batch id list.
    async fn execute_chunk(
        &self,
        run_mode_config: &RunModeConfig,
        offset: usize,
        chunk_ids: &[String],
        user_id: &str,
        brake: &FailureBrake,
    ) -> AppResult<()> {
        let test_cases = self.stores.test_cases.list_test_cases(chunk_ids).await?;
        let blobs = self
            .stores
            .test_cases
            .list_test_case_blobs(chunk_ids)
            .await?;
        let case_map: HashMap<&str, &ApiTestCase> =
            test_cases.iter().map(|c| (c.id.as_str(), c)).collect();
        let blob_map: HashMap<&str, &ApiTestCaseBlob> =
            blobs.iter().map(|b| (b.id.as_str(), b)).collect();

        let reports = match run_mode_config.integrated_report_id() {
            Some(report_id) if run_mode_config.is_integrated_report() => {
                let steps = chunk_ids
                    .iter()
                    .enumerate()
                    .map(|(i, id)| {
                        report_step(
                            report_id,
                            id,
                            case_map.get(id.as_str()).copied(),
                            (offset + i) as i64,
                        )
                    })
                    .collect();
                self.reports.insert_steps(steps).await?;
                ChunkReports::Integrated {
                    report_id: report_id.to_string(),
                }
            }
            None if run_mode_config.is_integrated_report() => {
                return Err(AppError::InvalidInput(
                    "integrated batch has no report id".to_string(),
                ));
            }
            _ => {
                let ordered: Vec<&ApiTestCase> = chunk_ids
                    .iter()
                    .filter_map(|id| case_map.get(id.as_str()).copied())
                    .collect();
                let records = self
                    .reports
                    .create_per_resource_reports(run_mode_config, &ordered, user_id)
                    .await?;
                ChunkReports::PerCase(
                    records
                        .into_iter()
                        .map(|r| (r.api_test_case_id, r.api_report_id))
                        .collect(),
                )
            }
        };

        for id in chunk_ids {
            let Some(test_case) = case_map.get(id.as_str()).copied() else {
                if let ChunkReports::Integrated { report_id } = &reports {
                    self.stores.sets.remove_item(report_id, id).await?;
                }
                info!(
                    resource_id = %id,
                    "Test case no longer exists, skipping the rest of this chunk"
                );
                break;
            };

            let report_id = match &reports {
                ChunkReports::Integrated { .. } => self.ids.next_id(),
                ChunkReports::PerCase(by_case) => match by_case.get(id) {
                    Some(report_id) => report_id.clone(),
                    None => {
                        warn!(resource_id = %id, "No report created for test case");
                        continue;
                    }
                },
            };

            let task = task_request(report_id.clone(), test_case, run_mode_config);
            if let Err(e) = self
                .dispatch(task, test_case, blob_map.get(id.as_str()).copied())
                .await
            {
                error!(
                    report_id = %report_id,
                    resource_id = %id,
                    error = %e,
                    "Failed to execute test case"
                );
                if brake.record_failure() {
                    error!(
                        failures = brake.failures(),
                        threshold = self.settings.failure_threshold,
                        "Too many failures, stopping chunk"
                    );
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        task: TaskRequest,
        test_case: &ApiTestCase,
        blob: Option<&ApiTestCaseBlob>,
    ) -> AppResult<()> {
        let blob = blob.ok_or_else(|| {
            AppError::NotFound(format!("Request definition of test case {}", test_case.id))
        })?;
        let request = blob.request_json()?;

        let environment = match resolve_environment_id(&task.run_mode_config, test_case) {
            Some(environment_id) => {
                let environment = self
                    .stores
                    .environments
                    .get_environment(&environment_id)
                    .await?;
                if environment.is_none() {
                    warn!(
                        environment_id = %environment_id,
                        resource_id = %test_case.id,
                        "Environment not found, dispatching without it"
                    );
                }
                environment
            }
            None => None,
        };

        debug!(
            report_id = %task.report_id,
            resource_id = %task.resource_id,
            "Dispatching task"
        );
        self.engine
            .submit(ExecutionDispatch {
                task,
                test_case: test_case.clone(),
                request,
                environment,
            })
            .await
    }
}

fn task_request(
    report_id: String,
    test_case: &ApiTestCase,
    run_mode_config: &RunModeConfig,
) -> TaskRequest {
    TaskRequest {
        report_id,
        resource_id: test_case.id.clone(),
        resource_type: RESOURCE_TYPE_API_CASE.to_string(),
        project_id: test_case.project_id.clone(),
        run_mode: TASK_RUN_MODE_RUN.to_string(),
        save_result: true,
        real_time: false,
        run_mode_config: run_mode_config.clone(),
        queue_id: None,
    }
}
