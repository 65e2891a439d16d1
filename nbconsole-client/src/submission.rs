//! Execution submission flow
//!
//! Turns a pipeline's parameter schema plus raw user input into a typed task
//! request, sends it, and reports what happened as a human-readable trail.

use std::collections::HashMap;

use nbconsole_core::domain::pipeline::Pipeline;
use nbconsole_core::dto::task::{SubmitResponse, SubmitTasks, TaskRequest};
use nbconsole_core::params::build_params;
use nbconsole_core::validation::ValidationErrors;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ApiClient;
use crate::error::ClientError;

/// Version tag sent with every submission unless configured otherwise
pub const DEFAULT_VERSION: &str = "v1";

const GENERIC_FAILURE: &str = "submission failed, no detail was returned by the server";

/// What the server made of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { request_ids: Vec<Uuid> },
    Rejected { message: String },
}

/// Outcome plus the ordered log trail shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub log: Vec<String>,
}

impl SubmissionReport {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, SubmissionOutcome::Accepted { .. })
    }
}

/// Submits executions through an [`ApiClient`]
#[derive(Debug, Clone)]
pub struct Submitter<'a> {
    client: &'a ApiClient,
    version: String,
}

impl<'a> Submitter<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self::with_version(client, DEFAULT_VERSION)
    }

    pub fn with_version(client: &'a ApiClient, version: impl Into<String>) -> Self {
        Self {
            client,
            version: version.into(),
        }
    }

    /// Validate, coerce and submit
    ///
    /// Validation errors are returned as `Err` and nothing is sent. Once the
    /// request goes out, both success and failure come back as a report.
    pub async fn submit(
        &self,
        pipeline: &Pipeline,
        raw: &HashMap<String, String>,
    ) -> Result<SubmissionReport, ValidationErrors> {
        let request = build_request(pipeline, raw, &self.version)?;
        let mut log = vec![
            format!(
                "Validated {} parameter(s) for '{}'",
                pipeline.parameters.len(),
                pipeline.name
            ),
            format!("Submitting '{}' (version {})", pipeline.name, self.version),
        ];

        let result = self.client.submit_tasks(&request).await;
        let report = into_report(result, &mut log);
        match &report.outcome {
            SubmissionOutcome::Accepted { request_ids } => {
                info!(pipeline = %pipeline.name, count = request_ids.len(), "Submission accepted")
            }
            SubmissionOutcome::Rejected { message } => {
                warn!(pipeline = %pipeline.name, "Submission rejected: {}", message)
            }
        }
        Ok(report)
    }
}

/// Build the `POST /submit` body for one pipeline run
pub fn build_request(
    pipeline: &Pipeline,
    raw: &HashMap<String, String>,
    version: &str,
) -> Result<SubmitTasks, ValidationErrors> {
    let params = build_params(pipeline, raw)?;
    Ok(SubmitTasks {
        tasks: vec![TaskRequest {
            notebook_name: pipeline.name.clone(),
            version: version.to_string(),
            params,
        }],
    })
}

fn into_report(
    result: Result<SubmitResponse, ClientError>,
    log: &mut Vec<String>,
) -> SubmissionReport {
    let outcome = match result {
        Ok(response) => {
            log.push(format!(
                "Submission accepted: {} request id(s)",
                response.request_ids.len()
            ));
            if let Some(message) = response.message.filter(|m| !m.trim().is_empty()) {
                log.push(format!("Server says: {}", message));
            }
            log.extend(response.request_ids.iter().map(|id| format!("Request id: {}", id)));
            SubmissionOutcome::Accepted {
                request_ids: response.request_ids,
            }
        }
        Err(err) => {
            let message = err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            log.push(format!("Submission failed: {}", message));
            SubmissionOutcome::Rejected { message }
        }
    };

    SubmissionReport {
        outcome,
        log: std::mem::take(log),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbconsole_core::domain::parameter::{ParameterType, PipelineParameter};
    use serde_json::json;

    fn pipeline() -> Pipeline {
        Pipeline {
            id: Uuid::new_v4(),
            name: "daily_sales".to_string(),
            description: None,
            created_at: chrono::Utc::now(),
            parameters: vec![
                PipelineParameter::new("limit", ParameterType::Integer),
                PipelineParameter::new("filters", ParameterType::Dict),
            ],
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_request_shape() {
        let req = build_request(
            &pipeline(),
            &raw(&[("limit", "42"), ("filters", r#"{"region":"south"}"#)]),
            "v1",
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "tasks": [{
                    "notebook_name": "daily_sales",
                    "version": "v1",
                    "params": {"limit": 42, "filters": {"region": "south"}}
                }]
            })
        );
    }

    #[test]
    fn test_build_request_blocks_invalid_input() {
        let errors = build_request(&pipeline(), &raw(&[("limit", "4.2")]), "v1").unwrap_err();
        assert_eq!(errors.for_field("limit").count(), 1);
        assert_eq!(errors.for_field("filters").count(), 1);
    }

    #[test]
    fn test_report_on_success() {
        let id = Uuid::new_v4();
        let mut log = vec!["start".to_string()];
        let report = into_report(
            Ok(SubmitResponse {
                request_ids: vec![id],
                message: Some("queued".to_string()),
            }),
            &mut log,
        );

        assert!(report.is_accepted());
        assert_eq!(
            report.log,
            vec![
                "start".to_string(),
                "Submission accepted: 1 request id(s)".to_string(),
                "Server says: queued".to_string(),
                format!("Request id: {}", id),
            ]
        );
    }

    #[test]
    fn test_report_prefers_server_detail() {
        let mut log = Vec::new();
        let report = into_report(
            Err(ClientError::api_error(
                422,
                r#"{"detail":[{"msg":"missing param limit"}]}"#,
            )),
            &mut log,
        );
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                message: "missing param limit".to_string()
            }
        );
        assert_eq!(report.log, vec!["Submission failed: missing param limit"]);
    }

    #[test]
    fn test_report_ignores_body_without_detail() {
        let mut log = Vec::new();
        let report = into_report(
            Err(ClientError::api_error(
                502,
                "<html><body><h1>502 Bad Gateway</h1></body></html>",
            )),
            &mut log,
        );
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                message: GENERIC_FAILURE.to_string()
            }
        );
        assert_eq!(report.log, vec![format!("Submission failed: {}", GENERIC_FAILURE)]);
    }

    #[test]
    fn test_report_falls_back_to_generic_message() {
        let mut log = Vec::new();
        let report = into_report(Err(ClientError::ParseError("eof".into())), &mut log);
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                message: GENERIC_FAILURE.to_string()
            }
        );
    }
}
