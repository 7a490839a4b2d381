//! Business logic services.

pub mod batch_run;
pub mod engine;
pub mod environment;
pub mod memory_store;
pub mod report_builder;
pub mod selection;
pub mod store;

pub use batch_run::{BatchRunService, FailureBrake};
pub use engine::HttpExecutionEngine;
pub use memory_store::MemoryStore;
pub use report_builder::ReportBuilder;
pub use store::{
    EnvironmentStore, ExecutionEngine, ExecutionQueueStore, ExecutionSetStore, IdGenerator,
    ReportStore, Stores, TestCaseStore, UuidIdGenerator,
};
