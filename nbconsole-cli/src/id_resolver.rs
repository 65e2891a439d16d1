//! Pipeline resolver module
//!
//! Resolves what the user typed (full id, exact name, or id prefix) to a
//! pipeline in the local catalog. Prefixes let users skip pasting full UUIDs.

use anyhow::{Result, anyhow};
use nbconsole_client::CatalogStore;
use nbconsole_core::domain::pipeline::Pipeline;

use crate::types::PipelineRef;

/// Resolve a pipeline reference against the catalog
///
/// Order of precedence: full UUID, exact name, then id prefix.
///
/// # Errors
/// Returns an error if:
/// - No pipeline matches
/// - Multiple pipelines match the prefix (ambiguous)
pub fn resolve_pipeline<'a>(catalog: &'a CatalogStore, reference: &PipelineRef) -> Result<&'a Pipeline> {
    let text = match reference {
        PipelineRef::Id(uuid) => {
            return catalog
                .get(*uuid)
                .ok_or_else(|| anyhow!("No pipeline with ID '{}' in the catalog", uuid));
        }
        PipelineRef::Text(text) => text,
    };

    if let Some(pipeline) = catalog.find_by_name(text) {
        return Ok(pipeline);
    }

    let prefix = text.to_lowercase();
    let matches: Vec<_> = catalog
        .pipelines()
        .iter()
        .filter(|p| p.id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No pipeline named '{}' or with ID starting with '{}'",
            text,
            prefix
        )),
        [pipeline] => Ok(*pipeline),
        _ => {
            let ids: Vec<String> = matches.iter().map(|p| p.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple pipelines: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
