//! Database queries for serial execution queues.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, Set, Statement,
    TransactionTrait,
};
use tracing::debug;

use crate::entity::execution_queue::{self as queue, Entity as Queue};
use crate::entity::execution_queue_detail::{self as detail, Entity as QueueDetail};
use crate::error::{AppError, AppResult};
use crate::models::{ExecutionQueue, ExecutionQueueDetail, RunModeConfig};
use crate::services::store::ExecutionQueueStore;

use super::DbPool;

/// Details written per INSERT statement.
const DETAIL_INSERT_BATCH: usize = 1000;

/// Claims the lowest unclaimed sort. SKIP LOCKED keeps concurrent advances of
/// the same queue from claiming one detail twice.
const CLAIM_NEXT_DETAIL_SQL: &str = r#"
    UPDATE execution_queue_details
    SET claimed_at = $2
    WHERE queue_id = $1
      AND sort = (
          SELECT sort FROM execution_queue_details
          WHERE queue_id = $1 AND claimed_at IS NULL
          ORDER BY sort ASC
          LIMIT 1
          FOR UPDATE SKIP LOCKED
      )
    RETURNING queue_id, sort, resource_id, resource_type, claimed_at
"#;

impl From<detail::Model> for ExecutionQueueDetail {
    fn from(model: detail::Model) -> Self {
        ExecutionQueueDetail {
            queue_id: model.queue_id,
            resource_id: model.resource_id,
            resource_type: model.resource_type,
            sort: model.sort,
        }
    }
}

impl TryFrom<queue::Model> for ExecutionQueue {
    type Error = AppError;

    fn try_from(model: queue::Model) -> Result<Self, Self::Error> {
        let run_mode_config: RunModeConfig = serde_json::from_value(model.run_mode_config)?;
        Ok(ExecutionQueue {
            queue_id: model.queue_id,
            run_mode_config,
            user_id: model.user_id,
            create_time: model.created_at,
        })
    }
}

#[async_trait]
impl ExecutionQueueStore for DbPool {
    async fn insert_queue(
        &self,
        execution_queue: &ExecutionQueue,
        details: Vec<ExecutionQueueDetail>,
    ) -> AppResult<()> {
        let header = queue::ActiveModel {
            queue_id: Set(execution_queue.queue_id.clone()),
            run_mode_config: Set(serde_json::to_value(&execution_queue.run_mode_config)?),
            user_id: Set(execution_queue.user_id.clone()),
            last_claimed_sort: Set(None),
            created_at: Set(execution_queue.create_time),
        };

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        Queue::insert(header)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert queue: {}", e)))?;

        for slice in details.chunks(DETAIL_INSERT_BATCH) {
            let models = slice.iter().map(|d| detail::ActiveModel {
                queue_id: Set(d.queue_id.clone()),
                sort: Set(d.sort),
                resource_id: Set(d.resource_id.clone()),
                resource_type: Set(d.resource_type.clone()),
                claimed_at: Set(None),
            });
            QueueDetail::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert queue details: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit queue: {}", e)))?;

        debug!(
            queue_id = %execution_queue.queue_id,
            details = details.len(),
            "Inserted execution queue"
        );
        Ok(())
    }

    async fn get_queue(&self, queue_id: &str) -> AppResult<Option<ExecutionQueue>> {
        let result = Queue::find_by_id(queue_id.to_string())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get queue: {}", e)))?;

        result.map(ExecutionQueue::try_from).transpose()
    }

    async fn get_next_detail(&self, queue_id: &str) -> AppResult<Option<ExecutionQueueDetail>> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let claimed = detail::Model::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            CLAIM_NEXT_DETAIL_SQL,
            [queue_id.into(), Utc::now().into()],
        ))
        .one(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to claim next queue detail: {}", e)))?;

        if let Some(ref claimed) = claimed {
            Queue::update_many()
                .col_expr(queue::Column::LastClaimedSort, Expr::value(claimed.sort))
                .filter(queue::Column::QueueId.eq(queue_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to advance queue cursor: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit queue claim: {}", e)))?;

        Ok(claimed.map(ExecutionQueueDetail::from))
    }
}
