//! Migration: Create API test case tables.
//!
//! Test cases are authored elsewhere; the batch runner reads them to select
//! and dispatch work.

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
                CREATE TABLE api_test_cases (
                    id VARCHAR(64) PRIMARY KEY,
                    project_id VARCHAR(64) NOT NULL,
                    module_id VARCHAR(64),
                    name VARCHAR(255) NOT NULL,
                    environment_id VARCHAR(64),
                    pos BIGINT NOT NULL DEFAULT 0,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- Index for select-all queries (active only)
                CREATE INDEX idx_api_test_cases_project_pos ON api_test_cases(project_id, pos, id)
                    WHERE deleted_at IS NULL;

                CREATE TABLE api_test_case_blobs (
                    id VARCHAR(64) PRIMARY KEY REFERENCES api_test_cases(id) ON DELETE CASCADE,
                    request BYTEA NOT NULL
                );
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
                DROP TABLE IF EXISTS api_test_case_blobs CASCADE;
                DROP TABLE IF EXISTS api_test_cases CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
