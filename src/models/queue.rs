//! Durable execution queue models for serial batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RunModeConfig;

/// Resource type tag for API test cases.
pub const RESOURCE_TYPE_API_CASE: &str = "API_CASE";

/// Header of a serial batch queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionQueue {
    pub queue_id: String,
    /// Snapshot of the run-mode configuration the queue was created with.
    pub run_mode_config: RunModeConfig,
    pub user_id: String,
    pub create_time: DateTime<Utc>,
}

/// One pending resource of a queue. `sort` is the resource's position in the
/// resolved id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionQueueDetail {
    pub queue_id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub sort: i64,
}

impl ExecutionQueueDetail {
    /// Build the ordered details for `resource_ids`, sort starting at 0.
    pub fn for_resources(queue_id: &str, resource_ids: &[String]) -> Vec<Self> {
        resource_ids
            .iter()
            .enumerate()
            .map(|(sort, resource_id)| Self {
                queue_id: queue_id.to_string(),
                resource_id: resource_id.clone(),
                resource_type: RESOURCE_TYPE_API_CASE.to_string(),
                sort: sort as i64,
            })
            .collect()
    }
}

/// Result of advancing a serial queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The next detail was claimed and dispatched.
    Dispatched { resource_id: String, sort: i64 },
    /// The next detail was claimed but its test case no longer exists.
    /// Nothing was dispatched and the queue does not move on by itself.
    Skipped { resource_id: String, sort: i64 },
    /// Every detail has been claimed.
    Drained,
}
