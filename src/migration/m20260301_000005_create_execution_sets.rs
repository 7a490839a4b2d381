//! Migration: Create execution set table for integrated parallel batches.

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
                CREATE TABLE execution_set_items (
                    report_id VARCHAR(64) NOT NULL,
                    resource_id VARCHAR(64) NOT NULL,
                    PRIMARY KEY (report_id, resource_id)
                );
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS execution_set_items CASCADE;")
            .await?;

        Ok(())
    }
}
