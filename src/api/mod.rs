//! API endpoint modules.

pub mod batch_runs;
pub mod health;
pub mod openapi;

pub use batch_runs::configure_routes as configure_batch_run_routes;
pub use health::configure_health_routes;
pub use openapi::{ApiDoc, configure_openapi_routes};
