//! Error types for the nbconsole client

use nbconsole_core::dto::task::ErrorBody;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the execution API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error detail from the API, or the raw body when it had none
        message: String,
        /// The `detail` field of the body, when the API sent one
        detail: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from a status code and the response body
    ///
    /// FastAPI-style `{"detail": ...}` bodies are reduced to their message;
    /// anything else (an HTML error page from a proxy, say) is kept only for
    /// display and never treated as a detail.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let detail = ErrorBody::detail_from(&body).filter(|d| !d.trim().is_empty());
        let message = detail.clone().unwrap_or(body);
        Self::ApiError {
            status,
            message,
            detail,
        }
    }

    /// The server-provided detail, if this error carries one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ApiError { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
