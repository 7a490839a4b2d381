//! Effective environment resolution.

use crate::models::{ApiTestCase, RunModeConfig};

/// Environment a test case runs in: the batch override when set, otherwise
/// the test case's own environment.
pub fn resolve_environment_id(
    run_mode_config: &RunModeConfig,
    test_case: &ApiTestCase,
) -> Option<String> {
    run_mode_config
        .environment_override()
        .map(str::to_string)
        .or_else(|| {
            test_case
                .environment_id
                .clone()
                .filter(|id| !id.trim().is_empty())
        })
}
