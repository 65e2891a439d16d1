//! Pipeline command handlers
//!
//! Handles catalog synchronization, listing, inspection, and the
//! create/update/delete calls that are mirrored into the local catalog.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use nbconsole_client::{ApiClient, CatalogStore};
use nbconsole_core::domain::parameter::PipelineParameter;
use nbconsole_core::domain::pipeline::Pipeline;
use nbconsole_core::dto::pipeline::PipelineDraft;
use nbconsole_core::validation::validate_pipeline;

use super::{print_notification, print_validation_errors};
use crate::config::Config;
use crate::id_resolver::resolve_pipeline;
use crate::types::{PipelineRef, parse_param_decl};

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Refresh the local catalog from the API
    Sync,
    /// List pipelines
    List {
        /// Use the local catalog without contacting the API
        #[arg(long)]
        offline: bool,
    },
    /// Show pipeline details
    Show {
        /// Pipeline ID, unambiguous ID prefix, or name
        pipeline: String,
    },
    /// Register a new pipeline
    Create {
        /// Pipeline name (3-60 characters)
        #[arg(short, long)]
        name: String,

        /// Optional description (up to 255 characters)
        #[arg(short, long)]
        description: Option<String>,

        /// Parameter as NAME:type[=default] (repeatable)
        #[arg(short, long = "param", value_parser = parse_param_decl)]
        params: Vec<PipelineParameter>,
    },
    /// Edit an existing pipeline
    Update {
        /// Pipeline ID, unambiguous ID prefix, or name
        pipeline: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New description
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// Replacement parameter list as NAME:type[=default] (repeatable)
        #[arg(short, long = "param", value_parser = parse_param_decl)]
        params: Vec<PipelineParameter>,
    },
    /// Delete a pipeline
    Delete {
        /// Pipeline ID, unambiguous ID prefix, or name
        pipeline: String,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `config` - The CLI configuration
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.api_client()?;
    let mut catalog = CatalogStore::open(&config.catalog_path);

    match command {
        PipelineCommands::Sync => sync_catalog(&client, &mut catalog).await,
        PipelineCommands::List { offline } => list_pipelines(&client, &mut catalog, offline).await,
        PipelineCommands::Show { pipeline } => show_pipeline(&catalog, &pipeline),
        PipelineCommands::Create {
            name,
            description,
            params,
        } => {
            let draft = PipelineDraft {
                name,
                description,
                parameters: params,
            };
            create_pipeline(&client, &mut catalog, draft).await
        }
        PipelineCommands::Update {
            pipeline,
            name,
            description,
            clear_description,
            params,
        } => {
            let existing = resolve_pipeline(&catalog, &PipelineRef::parse(&pipeline))?;
            let mut draft = PipelineDraft::from(existing);
            if let Some(name) = name {
                draft.name = name;
            }
            if clear_description {
                draft.description = None;
            } else if description.is_some() {
                draft.description = description;
            }
            if !params.is_empty() {
                draft.parameters = params;
            }
            let id = existing.id;
            update_pipeline(&client, &mut catalog, id, draft).await
        }
        PipelineCommands::Delete { pipeline } => {
            delete_pipeline(&client, &mut catalog, &pipeline).await
        }
    }
}

/// Make sure the catalog has something to resolve against
///
/// An empty catalog is synced first; a failed sync is reported and the
/// (empty) cache is used as-is.
pub async fn ensure_catalog(client: &ApiClient, catalog: &mut CatalogStore) {
    if catalog.is_empty() {
        if let Err(e) = catalog.sync(client).await {
            print_notification(format!("Could not fetch pipelines: {}", e));
        }
    }
}

/// Fetch all pipelines and overwrite the local catalog
async fn sync_catalog(client: &ApiClient, catalog: &mut CatalogStore) -> Result<()> {
    let count = catalog
        .sync(client)
        .await
        .context("Failed to fetch pipelines")?;

    println!(
        "{}",
        format!("✓ Catalog synchronized: {} pipeline(s)", count)
            .green()
            .bold()
    );
    println!("  Stored at: {}", catalog.path().display().to_string().dimmed());

    Ok(())
}

/// List pipelines, refreshing first unless offline
async fn list_pipelines(client: &ApiClient, catalog: &mut CatalogStore, offline: bool) -> Result<()> {
    if !offline {
        if let Err(e) = catalog.sync(client).await {
            print_notification(format!("Could not refresh pipelines, showing cached catalog: {}", e));
        }
    }

    if catalog.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", catalog.len()).bold()
        );
        println!();
        for pipeline in catalog.pipelines() {
            print_pipeline_summary(pipeline);
        }
    }

    Ok(())
}

/// Show a single pipeline from the catalog
fn show_pipeline(catalog: &CatalogStore, reference: &str) -> Result<()> {
    let pipeline = resolve_pipeline(catalog, &PipelineRef::parse(reference))?;

    print_pipeline_details(pipeline);

    Ok(())
}

/// Validate and register a new pipeline
async fn create_pipeline(
    client: &ApiClient,
    catalog: &mut CatalogStore,
    draft: PipelineDraft,
) -> Result<()> {
    let draft = draft.normalized();
    if let Err(errors) = validate_pipeline(&draft) {
        print_validation_errors(&errors);
        anyhow::bail!("Pipeline definition is invalid");
    }

    let pipeline = client
        .create_pipeline(&draft)
        .await
        .context("Failed to create pipeline")?;
    catalog.add(pipeline.clone());

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Name:   {}", pipeline.name.bold());
    print_parameters(&pipeline);

    Ok(())
}

/// Validate and replace a pipeline's definition
async fn update_pipeline(
    client: &ApiClient,
    catalog: &mut CatalogStore,
    id: uuid::Uuid,
    draft: PipelineDraft,
) -> Result<()> {
    let draft = draft.normalized();
    if let Err(errors) = validate_pipeline(&draft) {
        print_validation_errors(&errors);
        anyhow::bail!("Pipeline definition is invalid");
    }

    let pipeline = client
        .update_pipeline(id, &draft)
        .await
        .context("Failed to update pipeline")?;
    catalog.update(pipeline.clone());

    println!("{}", "✓ Pipeline updated successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Name:   {}", pipeline.name.bold());
    print_parameters(&pipeline);

    Ok(())
}

/// Delete a pipeline remotely, then drop it from the catalog
async fn delete_pipeline(client: &ApiClient, catalog: &mut CatalogStore, reference: &str) -> Result<()> {
    let pipeline = resolve_pipeline(catalog, &PipelineRef::parse(reference))?;
    let (id, name) = (pipeline.id, pipeline.name.clone());

    client
        .delete_pipeline(id)
        .await
        .context("Failed to delete pipeline")?;
    catalog.remove(id);

    println!(
        "{}",
        format!("✓ Pipeline {} ({}) deleted successfully!", name, id)
            .green()
            .bold()
    );

    Ok(())
}

/// Print a pipeline summary
fn print_pipeline_summary(pipeline: &Pipeline) {
    println!("  {} {}", "▸".cyan(), pipeline.name.bold());
    println!("    ID:      {}", pipeline.id.to_string().dimmed());
    println!(
        "    Created: {}",
        pipeline
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(desc) = &pipeline.description {
        println!("    Description: {}", desc.dimmed());
    }
    if !pipeline.parameters.is_empty() {
        let names: Vec<&str> = pipeline.parameters.iter().map(|p| p.name.as_str()).collect();
        println!("    Params:  {}", names.join(", ").dimmed());
    }
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Name:        {}", pipeline.name.bold());
    if let Some(desc) = &pipeline.description {
        println!("  Description: {}", desc);
    }
    println!(
        "  Created:     {}",
        pipeline.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    print_parameters(pipeline);
}

fn print_parameters(pipeline: &Pipeline) {
    if pipeline.parameters.is_empty() {
        return;
    }

    println!("\n{}", "Parameters:".bold());
    for param in &pipeline.parameters {
        println!(
            "  - {}: {} {}",
            param.name.cyan(),
            param.param_type.to_string().dimmed(),
            param
                .default
                .as_ref()
                .map(|d| format!("(default: {})", d))
                .unwrap_or_default()
                .dimmed()
        );
    }
}
