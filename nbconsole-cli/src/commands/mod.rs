//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod submit;
mod task;

pub use pipeline::PipelineCommands;
pub use submit::SubmitArgs;
pub use task::TaskCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use nbconsole_core::validation::ValidationErrors;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline catalog management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Submit an execution of a pipeline
    Submit(SubmitArgs),
    /// Execution monitoring
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Submit(args) => submit::handle_submit(args, config).await,
        Commands::Task { command } => task::handle_task_command(command, config).await,
    }
}

/// Print field errors the way a form shows them next to each input
fn print_validation_errors(errors: &ValidationErrors) {
    println!("{}", "✗ Please fix the following:".red().bold());
    for error in &errors.errors {
        println!("  {} {}", error.field.cyan(), error.message.red());
    }
}

/// Print a transient notification for a failed remote call
fn print_notification(message: impl std::fmt::Display) {
    eprintln!("{} {}", "⚠".yellow(), message.to_string().yellow());
}
