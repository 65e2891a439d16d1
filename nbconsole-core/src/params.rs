//! Parameter coercion
//!
//! Turns raw user-entered strings into typed JSON values according to the
//! pipeline's declared parameter schema.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::parameter::ParameterType;
use crate::domain::pipeline::Pipeline;
use crate::validation::ValidationErrors;

/// Why a raw value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("is required")]
    Required,
    #[error("must be an integer")]
    NotInteger,
    #[error("must be a number")]
    NotNumber,
    #[error("must be a JSON list")]
    NotList,
    #[error("must be a JSON object")]
    NotObject,
    #[error("is not a parameter of this pipeline")]
    Undeclared,
}

/// Coerce one raw value to the declared type
///
/// Empty input is rejected before any type-specific check. Strings are kept
/// verbatim; every other type is parsed from the trimmed input.
pub fn coerce(param_type: ParameterType, raw: &str) -> Result<Value, ParameterError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParameterError::Required);
    }

    match param_type {
        ParameterType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ParameterError::NotInteger),
        ParameterType::Number | ParameterType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(ParameterError::NotNumber),
        ParameterType::List => match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Array(_)) => Ok(value),
            _ => Err(ParameterError::NotList),
        },
        ParameterType::Dict => match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Object(_)) => Ok(value),
            _ => Err(ParameterError::NotObject),
        },
        ParameterType::String => Ok(Value::String(raw.to_string())),
    }
}

/// Build the typed parameter map for a submission
///
/// Every declared parameter is mandatory. A parameter with no supplied value
/// falls back to its declared default. Supplied keys the pipeline does not
/// declare are rejected. Errors are reported per field, keyed by parameter
/// name, in declaration order.
pub fn build_params(
    pipeline: &Pipeline,
    raw: &HashMap<String, String>,
) -> Result<Map<String, Value>, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut params = Map::new();

    for param in &pipeline.parameters {
        let value = raw
            .get(&param.name)
            .map(String::as_str)
            .or(param.default.as_deref())
            .unwrap_or_default();

        match coerce(param.param_type, value) {
            Ok(coerced) => {
                params.insert(param.name.clone(), coerced);
            }
            Err(err) => errors.push(param.name.clone(), err.to_string()),
        }
    }

    let mut undeclared: Vec<&String> = raw
        .keys()
        .filter(|key| pipeline.parameter(key).is_none())
        .collect();
    undeclared.sort();
    for key in undeclared {
        errors.push(key.clone(), ParameterError::Undeclared.to_string());
    }

    errors.into_result().map(|_| params)
}
