//! Pipeline-related API endpoints

use crate::ApiClient;
use crate::error::Result;
use nbconsole_core::domain::pipeline::Pipeline;
use nbconsole_core::dto::pipeline::PipelineDraft;
use uuid::Uuid;

impl ApiClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// List all pipelines registered on the server
    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let response = self.client.get(self.url("/pipelines")).send().await?;

        self.handle_response(response).await
    }

    /// Register a new pipeline
    ///
    /// The draft should already have passed
    /// [`validate_pipeline`](nbconsole_core::validation::validate_pipeline).
    ///
    /// # Example
    /// ```no_run
    /// # use nbconsole_client::ApiClient;
    /// # use nbconsole_core::dto::pipeline::PipelineDraft;
    /// # use nbconsole_core::domain::parameter::{ParameterType, PipelineParameter};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ApiClient::new("http://localhost:8000");
    /// let pipeline = client.create_pipeline(&PipelineDraft {
    ///     name: "daily_sales".to_string(),
    ///     description: Some("Sales rollup per region".to_string()),
    ///     parameters: vec![PipelineParameter::new("region", ParameterType::String)],
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pipeline(&self, draft: &PipelineDraft) -> Result<Pipeline> {
        let response = self
            .client
            .post(self.url("/pipelines"))
            .json(draft)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace a pipeline's definition
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline UUID
    /// * `draft` - The new name, description and parameter list
    pub async fn update_pipeline(&self, pipeline_id: Uuid, draft: &PipelineDraft) -> Result<Pipeline> {
        let response = self
            .client
            .put(self.url(&format!("/pipelines/{}", pipeline_id)))
            .json(draft)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline UUID to delete
    pub async fn delete_pipeline(&self, pipeline_id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/pipelines/{}", pipeline_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
