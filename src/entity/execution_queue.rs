//! Serial execution queue entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "execution_queues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub queue_id: String,
    /// Run-mode configuration snapshot
    #[sea_orm(column_type = "JsonBinary")]
    pub run_mode_config: JsonValue,
    pub user_id: String,
    /// Sort of the most recently claimed detail, NULL before the first claim
    pub last_claimed_sort: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::execution_queue_detail::Entity")]
    Details,
}

impl Related<super::execution_queue_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
