//! nbconsole CLI
//!
//! Command-line console for the notebook execution API: register pipelines,
//! submit executions and monitor their progress.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use nbconsole_client::catalog::default_catalog_path;
use nbconsole_client::submission::DEFAULT_VERSION;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nbconsole")]
#[command(about = "Notebook pipeline console", long_about = None)]
struct Cli {
    /// Execution API URL
    #[arg(
        long,
        global = true,
        env = "NBCONSOLE_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    /// Path of the local pipeline catalog
    #[arg(long, global = true, env = "NBCONSOLE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "NBCONSOLE_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Version tag sent with submissions
    #[arg(long, global = true, env = "NBCONSOLE_VERSION_TAG", default_value = DEFAULT_VERSION)]
    version_tag: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config {
        api_url: cli.api_url,
        catalog_path: cli.catalog.unwrap_or_else(default_catalog_path),
        timeout: Duration::from_secs(cli.timeout),
        version_tag: cli.version_tag,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}

/// Logs go to stderr so command output on stdout stays clean
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "nbconsole={lvl},nbconsole_client={lvl},nbconsole_core={lvl}",
            lvl = default_level
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
