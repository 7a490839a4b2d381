//! Database queries for execution sets.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

use crate::entity::execution_set_item::{self as item, Entity as ExecutionSetItem};
use crate::error::{AppError, AppResult};
use crate::services::store::ExecutionSetStore;

use super::DbPool;

/// Items written per INSERT statement.
const ITEM_INSERT_BATCH: usize = 1000;

#[async_trait]
impl ExecutionSetStore for DbPool {
    async fn init_set(&self, report_id: &str, resource_ids: &[String]) -> AppResult<()> {
        if resource_ids.is_empty() {
            return Ok(());
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for slice in resource_ids.chunks(ITEM_INSERT_BATCH) {
            let models = slice.iter().map(|resource_id| item::ActiveModel {
                report_id: Set(report_id.to_string()),
                resource_id: Set(resource_id.clone()),
            });
            ExecutionSetItem::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to initialize execution set: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit execution set: {}", e)))?;

        Ok(())
    }

    async fn remove_item(&self, report_id: &str, resource_id: &str) -> AppResult<()> {
        ExecutionSetItem::delete_many()
            .filter(item::Column::ReportId.eq(report_id))
            .filter(item::Column::ResourceId.eq(resource_id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to remove set item: {}", e)))?;

        Ok(())
    }
}
