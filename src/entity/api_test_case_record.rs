//! Report to test case link entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "api_test_case_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub api_report_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub api_test_case_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::api_report::Entity",
        from = "Column::ApiReportId",
        to = "super::api_report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
}

impl Related<super::api_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
