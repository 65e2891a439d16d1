//! Task-related API endpoints

use crate::ApiClient;
use crate::error::{ClientError, Result};
use nbconsole_core::domain::task::{Task, TaskStatusReport};
use nbconsole_core::dto::task::{SubmitResponse, SubmitTasks};
use uuid::Uuid;

impl ApiClient {
    // =============================================================================
    // Submission
    // =============================================================================

    /// Submit one or more execution requests
    ///
    /// The server may answer with an empty body; that is read as zero
    /// request ids rather than a parse failure.
    pub async fn submit_tasks(&self, req: &SubmitTasks) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/submit"))
            .json(req)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(SubmitResponse::default());
        }

        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse submit response: {}", e)))
    }

    // =============================================================================
    // Monitoring
    // =============================================================================

    /// List the most recent tasks with their logs
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = self.client.get(self.url("/tasks")).send().await?;

        self.handle_response(response).await
    }

    /// Get the status summary of one task
    ///
    /// # Arguments
    /// * `request_id` - The id returned at submission
    pub async fn get_task_status(&self, request_id: Uuid) -> Result<TaskStatusReport> {
        let response = self
            .client
            .get(self.url(&format!("/status/{}", request_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Download the artifact a successful task produced
    ///
    /// # Returns
    /// The raw bytes of the artifact
    pub async fn download_output(&self, request_id: Uuid) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{}/download", request_id)))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
