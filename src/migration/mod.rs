//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_api_test_cases;
mod m20260301_000002_create_environments;
mod m20260301_000003_create_api_reports;
mod m20260301_000004_create_execution_queues;
mod m20260301_000005_create_execution_sets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_api_test_cases::Migration),
            Box::new(m20260301_000002_create_environments::Migration),
            Box::new(m20260301_000003_create_api_reports::Migration),
            Box::new(m20260301_000004_create_execution_queues::Migration),
            Box::new(m20260301_000005_create_execution_sets::Migration),
        ]
    }
}
