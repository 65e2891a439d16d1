//! Submit command handler

use anyhow::Result;
use clap::Args;
use colored::*;
use nbconsole_client::submission::SubmissionOutcome;
use nbconsole_client::{CatalogStore, Submitter};
use std::collections::HashMap;

use super::pipeline::ensure_catalog;
use super::print_validation_errors;
use crate::config::Config;
use crate::id_resolver::resolve_pipeline;
use crate::types::{PipelineRef, parse_key_val};

/// Arguments of `nbconsole submit`
#[derive(Args)]
pub struct SubmitArgs {
    /// Pipeline ID, unambiguous ID prefix, or name
    pipeline: String,

    /// Parameter values as key=value pairs (e.g., -p rows=10 -p 'tags=["a"]')
    #[arg(short, long, value_parser = parse_key_val)]
    param: Vec<(String, String)>,
}

/// Validate the parameters against the pipeline's schema and submit
pub async fn handle_submit(args: SubmitArgs, config: &Config) -> Result<()> {
    let client = config.api_client()?;
    let mut catalog = CatalogStore::open(&config.catalog_path);
    ensure_catalog(&client, &mut catalog).await;

    let pipeline = resolve_pipeline(&catalog, &PipelineRef::parse(&args.pipeline))?;
    let raw: HashMap<String, String> = args.param.into_iter().collect();

    let report = match Submitter::with_version(&client, config.version_tag.as_str())
        .submit(pipeline, &raw)
        .await
    {
        Ok(report) => report,
        Err(errors) => {
            print_validation_errors(&errors);
            anyhow::bail!("Submission blocked by invalid parameters");
        }
    };

    for line in &report.log {
        println!("  {} {}", "·".dimmed(), line);
    }
    println!();

    match report.outcome {
        SubmissionOutcome::Accepted { request_ids } => {
            println!("{}", "✓ Execution submitted successfully!".green().bold());
            for id in request_ids {
                println!("  Request ID: {}", id.to_string().cyan());
            }
            Ok(())
        }
        SubmissionOutcome::Rejected { message } => {
            anyhow::bail!("Submission failed: {}", message)
        }
    }
}
