//! Task (execution) domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Execution record reported by the API
///
/// Owned and mutated by the remote system; the console only reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub request_id: Uuid,
    pub notebook_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "params_value")]
    pub params: serde_json::Value,
    pub status: TaskStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp::option")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub output_type: Option<OutputType>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<TaskLog>,
}

impl Task {
    /// Time between start and finish, when both are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some(finished.signed_duration_since(started)),
            _ => None,
        }
    }
}

/// Execution status
///
/// Transitions happen server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Started => "STARTED",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
            TaskStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            "STARTED" => Ok(TaskStatus::Started),
            "SUCCESS" => Ok(TaskStatus::Success),
            "FAILURE" => Ok(TaskStatus::Failure),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// Kind of artifact a successful task produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputType {
    Json,
    Excel,
    Xml,
    Other(String),
}

impl OutputType {
    /// File extension used when saving the artifact
    pub fn extension(&self) -> &str {
        match self {
            OutputType::Json => "json",
            OutputType::Excel => "xlsx",
            OutputType::Xml => "xml",
            OutputType::Other(_) => "bin",
        }
    }
}

impl From<String> for OutputType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => OutputType::Json,
            "excel" | "xlsx" => OutputType::Excel,
            "xml" => OutputType::Xml,
            _ => OutputType::Other(value),
        }
    }
}

impl From<OutputType> for String {
    fn from(value: OutputType) -> Self {
        match value {
            OutputType::Json => "json".to_string(),
            OutputType::Excel => "excel".to_string(),
            OutputType::Xml => "xml".to_string(),
            OutputType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Other(raw) => f.write_str(raw),
            known => f.write_str(&String::from(known.clone())),
        }
    }
}

/// One line of executor output attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLog {
    #[serde(alias = "mensagem")]
    pub message: String,
    #[serde(alias = "data", with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Status snapshot served by `GET /status/{request_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub status: TaskStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub output_type: Option<OutputType>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Task parameters arrive either as a JSON object or as the JSON text the
/// backend stored; both end up as a parsed value.
fn params_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<serde_json::Value, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?.unwrap_or_default();
    match value {
        serde_json::Value::String(text) => Ok(serde_json::from_str(&text)
            .unwrap_or(serde_json::Value::String(text))),
        other => Ok(other),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_TASK: &str = r#"{
        "request_id": "6f1c2f3e-8d4b-4f7a-9a51-3a2b1c0d9e8f",
        "notebook_name": "daily_sales",
        "version": "v1",
        "params": "{\"region\": \"south\", \"limit\": 5}",
        "status": "SUCCESS",
        "retry_count": 1,
        "created_at": "2025-05-02T08:00:00",
        "started_at": "2025-05-02T08:00:05",
        "finished_at": "2025-05-02T08:01:35",
        "output_type": "excel",
        "output_path": "/outputs/daily_sales.xlsx",
        "error": null,
        "logs": [{"mensagem": "notebook started", "data": "2025-05-02T08:00:05"}]
    }"#;

    #[test]
    fn test_task_from_raw_record() {
        let task: Task = serde_json::from_str(RAW_TASK).unwrap();
        assert_eq!(task.notebook_name, "daily_sales");
        assert_eq!(task.status, TaskStatus::Success);
        assert_eq!(task.params["limit"], 5);
        assert_eq!(task.output_type, Some(OutputType::Excel));
        assert_eq!(task.logs.len(), 1);
        assert_eq!(task.logs[0].message, "notebook started");
        assert_eq!(task.duration().map(|d| d.num_seconds()), Some(90));
    }

    #[test]
    fn test_task_tolerates_missing_optionals() {
        let task: Task = serde_json::from_str(
            r#"{
                "request_id": "6f1c2f3e-8d4b-4f7a-9a51-3a2b1c0d9e8f",
                "notebook_name": "daily_sales",
                "status": "PENDING",
                "created_at": "2025-05-02T08:00:00Z",
                "finished_at": null,
                "logs": null
            }"#,
        )
        .unwrap();
        assert_eq!(task.finished_at, None);
        assert!(task.logs.is_empty());
        assert_eq!(task.params, serde_json::Value::Null);
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let status: TaskStatus = serde_json::from_str("\"RETRY\"").unwrap();
        assert_eq!(status, TaskStatus::Unknown);
        assert_eq!("failure".parse::<TaskStatus>(), Ok(TaskStatus::Failure));
    }

    #[test]
    fn test_output_type_extension() {
        assert_eq!(OutputType::from("json".to_string()).extension(), "json");
        assert_eq!(OutputType::from("excel".to_string()).extension(), "xlsx");
        assert_eq!(OutputType::from("parquet".to_string()).to_string(), "parquet");
    }
}
