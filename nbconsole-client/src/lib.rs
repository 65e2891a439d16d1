//! nbconsole HTTP Client
//!
//! A type-safe client for the notebook execution API, plus the stateful
//! pieces the console builds on top of it:
//!
//! - [`ApiClient`]: one method per endpoint (pipelines, submissions, tasks)
//! - [`CatalogStore`]: locally persisted cache of pipeline definitions
//! - [`Submitter`]: validates raw parameter input and submits executions
//! - [`TaskMonitor`]: background poller over the task list
//!
//! # Example
//!
//! ```no_run
//! use nbconsole_client::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new("http://localhost:8000");
//!
//!     for pipeline in client.list_pipelines().await? {
//!         println!("{} ({} parameters)", pipeline.name, pipeline.parameters.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod monitor;
mod pipelines;
pub mod submission;
mod tasks;

// Re-export commonly used types
pub use catalog::CatalogStore;
pub use error::{ClientError, Result};
pub use monitor::{MonitorEvent, TaskMonitor, TaskSource};
pub use submission::{SubmissionOutcome, SubmissionReport, Submitter};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the notebook execution API
///
/// Endpoints are grouped by concern:
/// - Pipeline management (list, create, update, delete)
/// - Task submission
/// - Task monitoring (list, status, artifact download)
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL of the API (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the execution API (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use nbconsole_client::ApiClient;
    ///
    /// let client = ApiClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new API client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use nbconsole_client::ApiClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ApiClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize a JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body is irrelevant
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "API response");

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/tasks"), "http://localhost:8000/tasks");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = ApiClient::with_client("http://localhost:8000", http_client);
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
