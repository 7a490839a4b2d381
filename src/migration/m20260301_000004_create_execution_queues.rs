//! Migration: Create serial execution queue tables.
//!
//! A detail is claimed exactly once by stamping claimed_at; the queue row
//! keeps the sort of the last claim as the resumable cursor.

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
                CREATE TABLE execution_queues (
                    queue_id VARCHAR(64) PRIMARY KEY,
                    run_mode_config JSONB NOT NULL,
                    user_id VARCHAR(64) NOT NULL,
                    last_claimed_sort BIGINT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE TABLE execution_queue_details (
                    queue_id VARCHAR(64) NOT NULL REFERENCES execution_queues(queue_id) ON DELETE CASCADE,
                    sort BIGINT NOT NULL CHECK (sort >= 0),
                    resource_id VARCHAR(64) NOT NULL,
                    resource_type VARCHAR(20) NOT NULL,
                    claimed_at TIMESTAMPTZ,
                    PRIMARY KEY (queue_id, sort)
                );

                -- Index for claim-next (unclaimed only)
                CREATE INDEX idx_execution_queue_details_pending ON execution_queue_details(queue_id, sort)
                    WHERE claimed_at IS NULL;
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
                DROP TABLE IF EXISTS execution_queue_details CASCADE;
                DROP TABLE IF EXISTS execution_queues CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
