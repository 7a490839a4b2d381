//! SeaORM entity definitions for PostgreSQL database.

pub mod api_report;
pub mod api_report_step;
pub mod api_test_case;
pub mod api_test_case_blob;
pub mod api_test_case_record;
pub mod environment;
pub mod execution_queue;
pub mod execution_queue_detail;
pub mod execution_set_item;
