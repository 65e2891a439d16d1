//! Pipeline definition validation
//!
//! Checks run before a pipeline is sent to the API or written to the local
//! catalog. All field errors are collected so a form (or the CLI) can report
//! them together.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::dto::pipeline::PipelineDraft;
use crate::params::coerce;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MAX_CHARS: usize = 255;

static PARAMETER_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter key regex should compile")
});

/// An error attached to a single input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} invalid field(s): {}", .errors.len(), summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors reported for one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Validate a pipeline name (trimmed, counted in characters)
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if len < NAME_MIN_CHARS || len > NAME_MAX_CHARS {
        return Err(format!(
            "must be between {} and {} characters",
            NAME_MIN_CHARS, NAME_MAX_CHARS
        ));
    }
    Ok(())
}

/// Validate an optional description
pub fn validate_description(description: Option<&str>) -> Result<(), String> {
    match description {
        Some(text) if text.chars().count() > DESCRIPTION_MAX_CHARS => Err(format!(
            "must be at most {} characters",
            DESCRIPTION_MAX_CHARS
        )),
        _ => Ok(()),
    }
}

/// Whether a parameter key is a valid identifier
pub fn is_valid_parameter_key(key: &str) -> bool {
    PARAMETER_KEY_REGEX.is_match(key)
}

/// Validate a whole pipeline definition
///
/// Duplicate keys are reported on every occurrence after the first.
pub fn validate_pipeline(draft: &PipelineDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Err(message) = validate_name(&draft.name) {
        errors.push("name", message);
    }
    if let Err(message) = validate_description(draft.description.as_deref()) {
        errors.push("description", message);
    }

    let mut seen = HashSet::new();
    for (index, param) in draft.parameters.iter().enumerate() {
        let field = format!("parameters[{}].name", index);
        if !is_valid_parameter_key(&param.name) {
            errors.push(
                field,
                "must start with a letter or underscore and contain only letters, digits and underscores",
            );
        } else if !seen.insert(param.name.as_str()) {
            errors.push(field, format!("duplicate parameter '{}'", param.name));
        }

        if let Some(default) = param.default.as_deref().filter(|d| !d.trim().is_empty()) {
            if let Err(err) = coerce(param.param_type, default) {
                errors.push(format!("parameters[{}].value", index), err.to_string());
            }
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameter::{ParameterType, PipelineParameter};

    fn draft(name: &str, parameters: Vec<PipelineParameter>) -> PipelineDraft {
        PipelineDraft {
            name: name.to_string(),
            description: None,
            parameters,
        }
    }

    #[test]
    fn test_name_length_boundaries() {
        assert!(validate_name("ab").is_err());
        assert!(validate_name("abc").is_ok());
        assert!(validate_name(&"x".repeat(60)).is_ok());
        assert!(validate_name(&"x".repeat(61)).is_err());
        assert!(validate_name("  ab  ").is_err());
        assert!(validate_name("ção").is_ok());
    }

    #[test]
    fn test_description_limit() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some(&"d".repeat(255))).is_ok());
        assert!(validate_description(Some(&"d".repeat(256))).is_err());
    }

    #[test]
    fn test_parameter_key_pattern() {
        for key in ["region", "_private", "limit_2", "A"] {
            assert!(is_valid_parameter_key(key), "{key} should be valid");
        }
        for key in ["2fast", "with-dash", "has space", ""] {
            assert!(!is_valid_parameter_key(key), "{key} should be invalid");
        }
    }

    #[test]
    fn test_duplicate_key_flags_second_occurrence_only() {
        let d = draft(
            "sales report",
            vec![
                PipelineParameter::new("region", ParameterType::String),
                PipelineParameter::new("limit", ParameterType::Integer),
                PipelineParameter::new("region", ParameterType::String),
            ],
        );
        let errors = validate_pipeline(&d).unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].field, "parameters[2].name");
        assert_eq!(errors.for_field("parameters[0].name").count(), 0);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut d = draft(
            "no",
            vec![
                PipelineParameter::new("bad key", ParameterType::String),
                PipelineParameter::new("rows", ParameterType::Integer).with_default("ten"),
            ],
        );
        d.description = Some("d".repeat(300));

        let errors = validate_pipeline(&d).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "description",
                "parameters[0].name",
                "parameters[1].value"
            ]
        );
        assert_eq!(errors.errors[3].message, "must be an integer");
    }

    #[test]
    fn test_valid_pipeline_passes() {
        let d = draft(
            "daily_sales",
            vec![
                PipelineParameter::new("rows", ParameterType::Integer).with_default("10"),
                PipelineParameter::new("filters", ParameterType::Dict),
            ],
        );
        assert!(validate_pipeline(&d).is_ok());
    }
}
