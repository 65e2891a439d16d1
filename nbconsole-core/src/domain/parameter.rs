//! Pipeline parameter types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parameter declared by a pipeline
///
/// The default travels as a string in the `value` field, the way the
/// execution API stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl PipelineParameter {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Declared type of a pipeline parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[serde(alias = "int")]
    Integer,
    Number,
    Float,
    #[serde(alias = "str")]
    String,
    #[serde(alias = "array")]
    List,
    #[serde(alias = "object")]
    Dict,
}

impl ParameterType {
    pub const ALL: [ParameterType; 6] = [
        ParameterType::Integer,
        ParameterType::Number,
        ParameterType::Float,
        ParameterType::String,
        ParameterType::List,
        ParameterType::Dict,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Integer => "integer",
            ParameterType::Number => "number",
            ParameterType::Float => "float",
            ParameterType::String => "string",
            ParameterType::List => "list",
            ParameterType::Dict => "dict",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(ParameterType::Integer),
            "number" => Ok(ParameterType::Number),
            "float" => Ok(ParameterType::Float),
            "string" | "str" => Ok(ParameterType::String),
            "list" | "array" => Ok(ParameterType::List),
            "dict" | "object" => Ok(ParameterType::Dict),
            other => Err(format!(
                "unknown parameter type '{}' (expected one of: integer, number, float, string, list, dict)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_accepts_aliases() {
        assert_eq!("int".parse::<ParameterType>(), Ok(ParameterType::Integer));
        assert_eq!("Object".parse::<ParameterType>(), Ok(ParameterType::Dict));
        assert!("tuple".parse::<ParameterType>().is_err());

        let parsed: ParameterType = serde_json::from_str("\"int\"").unwrap();
        assert_eq!(parsed, ParameterType::Integer);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"integer\"");
    }

    #[test]
    fn test_parameter_wire_shape() {
        let param = PipelineParameter::new("rows", ParameterType::Integer).with_default("10");
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "rows", "type": "integer", "value": "10"})
        );

        let back: PipelineParameter =
            serde_json::from_str(r#"{"name":"rows","type":"int","value":null}"#).unwrap();
        assert_eq!(back.default, None);
    }
}
