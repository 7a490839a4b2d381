//! Batch run test suite.
//!
//! Drives `BatchRunService` against the in-process store with a recording
//! execution engine, plus the HTTP engine client against a mock engine server.
//!
//! Run with: cargo test --test batch_run


mod test_serial;
