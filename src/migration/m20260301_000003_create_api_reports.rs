//! Migration: Create report, report-case link and report step tables.
//!
//! Reports are created before dispatch so the execution engine can write
//! results against a known id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE api_reports (
                    id VARCHAR(64) PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    project_id VARCHAR(64) NOT NULL,
                    environment_id VARCHAR(64),
                    run_mode VARCHAR(20) NOT NULL
                        CHECK (run_mode IN ('SERIAL', 'PARALLEL')),
                    status VARCHAR(20) NOT NULL DEFAULT 'PENDING'
                        CHECK (status IN ('PENDING', 'RUNNING', 'SUCCESS', 'ERROR')),
                    integrated BOOLEAN NOT NULL DEFAULT FALSE,
                    trigger_mode VARCHAR(20) NOT NULL,
                    pool_id VARCHAR(64),
                    create_user VARCHAR(64) NOT NULL,
                    update_user VARCHAR(64) NOT NULL,
                    start_time TIMESTAMPTZ NOT NULL,
                    update_time TIMESTAMPTZ NOT NULL,
                    deleted BOOLEAN NOT NULL DEFAULT FALSE
                );

                CREATE INDEX idx_api_reports_project ON api_reports(project_id, start_time DESC)
                    WHERE deleted = FALSE;

                CREATE TABLE api_test_case_records (
                    api_report_id VARCHAR(64) NOT NULL REFERENCES api_reports(id) ON DELETE CASCADE,
                    api_test_case_id VARCHAR(64) NOT NULL,
                    PRIMARY KEY (api_report_id, api_test_case_id)
                );

                CREATE INDEX idx_api_test_case_records_case ON api_test_case_records(api_test_case_id);

                CREATE TABLE api_report_steps (
                    report_id VARCHAR(64) NOT NULL REFERENCES api_reports(id) ON DELETE CASCADE,
                    step_id VARCHAR(64) NOT NULL,
                    sort BIGINT NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    step_type VARCHAR(20) NOT NULL,
                    PRIMARY KEY (report_id, step_id)
                );

                CREATE INDEX idx_api_report_steps_sort ON api_report_steps(report_id, sort);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS api_report_steps CASCADE;
                DROP TABLE IF EXISTS api_test_case_records CASCADE;
                DROP TABLE IF EXISTS api_reports CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
