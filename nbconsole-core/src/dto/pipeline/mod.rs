//! Pipeline DTOs

use serde::{Deserialize, Serialize};

use crate::domain::parameter::PipelineParameter;
use crate::domain::pipeline::Pipeline;

/// Body of `POST /pipelines` and `PUT /pipelines/{id}`
///
/// Run it through [`crate::validation::validate_pipeline`] before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDraft {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<PipelineParameter>,
}

impl PipelineDraft {
    /// Trim the name and description as they will be stored
    ///
    /// A blank description becomes `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            parameters: self.parameters,
        }
    }
}

impl From<&Pipeline> for PipelineDraft {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            name: pipeline.name.clone(),
            description: pipeline.description.clone(),
            parameters: pipeline.parameters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_pipeline;

    #[test]
    fn test_normalized_trims_what_gets_stored() {
        let draft = PipelineDraft {
            name: "  abc ".to_string(),
            description: Some("   ".to_string()),
            parameters: Vec::new(),
        }
        .normalized();

        assert_eq!(draft.name, "abc");
        assert_eq!(draft.description, None);
        assert!(validate_pipeline(&draft).is_ok());

        let short = PipelineDraft {
            name: "  ab  ".to_string(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(short.name, "ab");
        assert!(validate_pipeline(&short).is_err());
    }
}
