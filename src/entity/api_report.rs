//! API report entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "api_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub environment_id: Option<String>,
    /// SERIAL or PARALLEL
    pub run_mode: String,
    /// PENDING, RUNNING, SUCCESS, ERROR
    pub status: String,
    pub integrated: bool,
    pub trigger_mode: String,
    pub pool_id: Option<String>,
    pub create_user: String,
    pub update_user: String,
    pub start_time: DateTimeUtc,
    pub update_time: DateTimeUtc,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::api_test_case_record::Entity")]
    Records,
    #[sea_orm(has_many = "super::api_report_step::Entity")]
    Steps,
}

impl Related<super::api_test_case_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::api_report_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Steps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
