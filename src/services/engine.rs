//! HTTP client for the external execution engine.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ExecutionDispatch;
use crate::services::store::ExecutionEngine;

/// Path the engine accepts task submissions on.
const SUBMIT_PATH: &str = "/api/v1/tasks";

/// Submits tasks to the execution engine over HTTP.
#[derive(Clone)]
pub struct HttpExecutionEngine {
    client: reqwest::Client,
    submit_url: String,
}

impl HttpExecutionEngine {
    /// Create a client; `timeout` bounds each submission.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Engine(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            submit_url: submit_url(base_url),
        })
    }
}

fn submit_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), SUBMIT_PATH)
}

#[async_trait]
impl ExecutionEngine for HttpExecutionEngine {
    async fn submit(&self, dispatch: ExecutionDispatch) -> AppResult<()> {
        let response = self
            .client
            .post(&self.submit_url)
            .json(&dispatch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Engine(format!(
                "engine rejected task for report {} with {}: {}",
                dispatch.task.report_id, status, body
            )));
        }

        debug!(
            report_id = %dispatch.task.report_id,
            resource_id = %dispatch.task.resource_id,
            "Task accepted by execution engine"
        );
        Ok(())
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.submit_url)
    }
}
