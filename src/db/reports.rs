//! Database queries for reports, report-case links and report steps.

use async_trait::async_trait;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use tracing::debug;

use crate::entity::api_report::{self, Entity as Report};
use crate::entity::api_report_step::{self, Entity as ReportStep};
use crate::entity::api_test_case_record::{self, Entity as TestCaseRecord};
use crate::error::{AppError, AppResult};
use crate::models::{ApiReport, ApiReportStep, ApiTestCaseRecord};
use crate::services::store::ReportStore;

use super::DbPool;

/// Rows written per INSERT statement. Reports carry 14 columns, so a slice
/// stays well under the 65,535 bind parameter limit.
const INSERT_BATCH: usize = 1000;

fn report_active_model(report: ApiReport) -> api_report::ActiveModel {
    api_report::ActiveModel {
        id: Set(report.id),
        name: Set(report.name),
        project_id: Set(report.project_id),
        environment_id: Set(report.environment_id),
        run_mode: Set(report.run_mode),
        status: Set(report.status.as_str().to_string()),
        integrated: Set(report.integrated),
        trigger_mode: Set(report.trigger_mode),
        pool_id: Set(report.pool_id),
        create_user: Set(report.create_user),
        update_user: Set(report.update_user),
        start_time: Set(report.start_time),
        update_time: Set(report.update_time),
        deleted: Set(report.deleted),
    }
}

#[async_trait]
impl ReportStore for DbPool {
    /// Reports and links commit together or not at all.
    async fn insert_api_reports(
        &self,
        reports: Vec<ApiReport>,
        records: Vec<ApiTestCaseRecord>,
    ) -> AppResult<()> {
        if reports.is_empty() {
            return Ok(());
        }

        let report_count = reports.len();
        let record_count = records.len();

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for slice in reports.chunks(INSERT_BATCH) {
            Report::insert_many(slice.iter().cloned().map(report_active_model))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert reports: {}", e)))?;
        }

        for slice in records.chunks(INSERT_BATCH) {
            let models = slice
                .iter()
                .map(|record| api_test_case_record::ActiveModel {
                    api_report_id: Set(record.api_report_id.clone()),
                    api_test_case_id: Set(record.api_test_case_id.clone()),
                });
            TestCaseRecord::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to insert report records: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit reports: {}", e)))?;

        debug!(
            reports = report_count,
            records = record_count,
            "Inserted reports"
        );
        Ok(())
    }

    async fn insert_report_steps(&self, steps: Vec<ApiReportStep>) -> AppResult<()> {
        if steps.is_empty() {
            return Ok(());
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for slice in steps.chunks(INSERT_BATCH) {
            let models = slice.iter().map(|step| api_report_step::ActiveModel {
                report_id: Set(step.report_id.clone()),
                step_id: Set(step.step_id.clone()),
                sort: Set(step.sort),
                name: Set(step.name.clone()),
                step_type: Set(step.step_type.clone()),
            });
            ReportStep::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to insert report steps: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit report steps: {}", e)))?;

        Ok(())
    }
}
