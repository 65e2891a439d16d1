//! Task submission DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /submit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTasks {
    pub tasks: Vec<TaskRequest>,
}

/// A single execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub notebook_name: String,
    pub version: String,
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Successful reply to `POST /submit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub request_ids: Vec<Uuid>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the API
///
/// Validation failures carry a list of `{msg}` items, explicit rejections a
/// plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Items(Vec<ErrorItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    pub msg: String,
}

impl ErrorBody {
    /// Parse an error body, returning its human-readable detail if it has one
    pub fn detail_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        let message = match parsed.detail {
            ErrorDetail::Text(text) => text,
            ErrorDetail::Items(items) => items
                .into_iter()
                .map(|item| item.msg)
                .collect::<Vec<_>>()
                .join("; "),
        };
        (!message.trim().is_empty()).then_some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_item_list() {
        let body = r#"{"detail":[{"msg":"field required","loc":["body","tasks"]},{"msg":"bad version"}]}"#;
        assert_eq!(
            ErrorBody::detail_from(body).as_deref(),
            Some("field required; bad version")
        );
    }

    #[test]
    fn test_detail_from_text_and_garbage() {
        assert_eq!(
            ErrorBody::detail_from(r#"{"detail":"Notebook not found"}"#).as_deref(),
            Some("Notebook not found")
        );
        assert_eq!(ErrorBody::detail_from("<html>502</html>"), None);
        assert_eq!(ErrorBody::detail_from(r#"{"detail":[]}"#), None);
    }
}
