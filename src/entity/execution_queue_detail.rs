//! Serial execution queue detail entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "execution_queue_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub queue_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sort: i64,
    pub resource_id: String,
    pub resource_type: String,
    /// Set once the detail has been handed out; never cleared
    pub claimed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::execution_queue::Entity",
        from = "Column::QueueId",
        to = "super::execution_queue::Column::QueueId",
        on_delete = "Cascade"
    )]
    Queue,
}

impl Related<super::execution_queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Queue.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
