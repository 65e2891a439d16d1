//! Configuration module
//!
//! Settings shared by every command: where the API lives, where the local
//! catalog is kept, and how requests are made.

use anyhow::{Context, Result};
use nbconsole_client::ApiClient;
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the execution API
    pub api_url: String,

    /// Location of the persisted pipeline catalog
    pub catalog_path: PathBuf,

    /// Per-request timeout
    pub timeout: Duration,

    /// Version tag sent with submissions
    pub version_tag: String,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        if self.version_tag.trim().is_empty() {
            anyhow::bail!("version_tag cannot be empty");
        }

        Ok(())
    }

    /// Build an API client honoring the configured timeout
    pub fn api_client(&self) -> Result<ApiClient> {
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ApiClient::with_client(&self.api_url, http_client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api_url: "http://localhost:8000".to_string(),
            catalog_path: PathBuf::from("catalog.json"),
            timeout: Duration::from_secs(30),
            version_tag: "v1".to_string(),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.api_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        config.api_url = "https://api.internal".to_string();
        assert!(config.validate().is_ok());

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config.timeout = Duration::from_secs(5);
        config.version_tag = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_client_uses_url() {
        let client = config().api_client().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
