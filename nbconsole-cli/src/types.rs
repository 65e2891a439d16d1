//! Common types used across CLI modules

use nbconsole_core::domain::parameter::{ParameterType, PipelineParameter};
use uuid::Uuid;

/// How the user referred to a pipeline: a full UUID, or text that is either
/// an exact name or an unambiguous id prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineRef {
    /// Full UUID
    Id(Uuid),
    /// Name or id prefix
    Text(String),
}

impl PipelineRef {
    /// Attempts to parse as a full UUID first, otherwise keeps the text
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input.trim()) {
            Ok(uuid) => PipelineRef::Id(uuid),
            Err(_) => PipelineRef::Text(input.trim().to_string()),
        }
    }
}

impl std::fmt::Display for PipelineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineRef::Id(uuid) => write!(f, "{}", uuid),
            PipelineRef::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for PipelineRef {
    fn from(s: &str) -> Self {
        PipelineRef::parse(s)
    }
}

/// Parse a single key=value pair
pub fn parse_key_val(s: &str) -> anyhow::Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].trim().to_string(), s[pos + 1..].to_string()))
}

/// Parse a parameter declaration of the form `name:type[=default]`
pub fn parse_param_decl(s: &str) -> anyhow::Result<PipelineParameter> {
    let (decl, default) = match s.find('=') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    let (name, type_name) = decl
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid NAME:type[=default]: no `:` found in `{}`", s))?;
    let param_type: ParameterType = type_name.parse().map_err(anyhow::Error::msg)?;

    let mut param = PipelineParameter::new(name.trim(), param_type);
    if let Some(default) = default.filter(|d| !d.is_empty()) {
        param = param.with_default(default);
    }
    Ok(param)
}
