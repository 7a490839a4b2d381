//! Pre-creation of reports before any test case is dispatched.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    ApiReport, ApiReportStatus, ApiReportStep, ApiTestCase, ApiTestCaseRecord, RunModeConfig,
    STEP_TYPE_API_CASE, TRIGGER_MODE_BATCH,
};
use crate::services::environment::resolve_environment_id;
use crate::services::store::{IdGenerator, ReportStore};

/// Builds and persists report records for a batch.
#[derive(Clone)]
pub struct ReportBuilder {
    store: Arc<dyn ReportStore>,
    ids: Arc<dyn IdGenerator>,
}

impl ReportBuilder {
    pub fn new(store: Arc<dyn ReportStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Create the single integrated report with one link per selected id and
    /// write its id back into the run-mode configuration.
    pub async fn create_integrated_report(
        &self,
        run_mode_config: &mut RunModeConfig,
        ids: &[String],
        user_id: &str,
        project_id: &str,
    ) -> AppResult<ApiReport> {
        let Some(collection_report) = run_mode_config.collection_report.as_ref() else {
            return Err(AppError::InvalidInput(
                "integrated report name is required".to_string(),
            ));
        };

        let mut report = self.base_report(run_mode_config, user_id);
        report.name = collection_report.report_name.clone();
        report.integrated = true;
        report.project_id = project_id.to_string();

        let records = ids
            .iter()
            .map(|id| ApiTestCaseRecord {
                api_report_id: report.id.clone(),
                api_test_case_id: id.clone(),
            })
            .collect();

        self.store
            .insert_api_reports(vec![report.clone()], records)
            .await?;

        if let Some(collection_report) = run_mode_config.collection_report.as_mut() {
            collection_report.report_id = Some(report.id.clone());
        }

        info!(
            report_id = %report.id,
            cases = ids.len(),
            "Created integrated report"
        );
        Ok(report)
    }

    /// Create one report per test case, in the order given.
    pub async fn create_per_resource_reports(
        &self,
        run_mode_config: &RunModeConfig,
        test_cases: &[&ApiTestCase],
        user_id: &str,
    ) -> AppResult<Vec<ApiTestCaseRecord>> {
        let mut reports = Vec::with_capacity(test_cases.len());
        let mut records = Vec::with_capacity(test_cases.len());

        for test_case in test_cases {
            let mut report = self.base_report(run_mode_config, user_id);
            report.environment_id = resolve_environment_id(run_mode_config, test_case);
            report.name = test_case.name.clone();
            report.project_id = test_case.project_id.clone();

            records.push(ApiTestCaseRecord {
                api_report_id: report.id.clone(),
                api_test_case_id: test_case.id.clone(),
            });
            reports.push(report);
        }

        self.store
            .insert_api_reports(reports, records.clone())
            .await?;
        Ok(records)
    }

    /// Insert ordered steps of an integrated report in one unit.
    pub async fn insert_steps(&self, steps: Vec<ApiReportStep>) -> AppResult<()> {
        self.store.insert_report_steps(steps).await
    }

    fn base_report(&self, run_mode_config: &RunModeConfig, user_id: &str) -> ApiReport {
        let now = Utc::now();
        ApiReport {
            id: self.ids.next_id(),
            name: String::new(),
            project_id: String::new(),
            environment_id: run_mode_config.environment_override().map(str::to_string),
            run_mode: run_mode_config.run_mode.as_str().to_string(),
            status: ApiReportStatus::Pending,
            integrated: false,
            trigger_mode: TRIGGER_MODE_BATCH.to_string(),
            pool_id: run_mode_config.pool_id.clone(),
            create_user: user_id.to_string(),
            update_user: user_id.to_string(),
            start_time: now,
            update_time: now,
            deleted: false,
        }
    }
}

/// Step standing for `step_id` inside an integrated report. The name is empty
/// when the test case has already disappeared.
pub fn report_step(
    report_id: &str,
    step_id: &str,
    test_case: Option<&ApiTestCase>,
    sort: i64,
) -> ApiReportStep {
    ApiReportStep {
        report_id: report_id.to_string(),
        step_id: step_id.to_string(),
        sort,
        name: test_case.map(|c| c.name.clone()).unwrap_or_default(),
        step_type: STEP_TYPE_API_CASE.to_string(),
    }
}
