//! Task command handlers
//!
//! Handles execution monitoring: one-shot listing, details and logs,
//! artifact download, and a polling `watch` view with interactive filters.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Subcommand};
use colored::*;
use nbconsole_client::monitor::DEFAULT_POLL_INTERVAL;
use nbconsole_client::{ApiClient, MonitorEvent, TaskMonitor};
use nbconsole_core::domain::task::{Task, TaskLog, TaskStatus};
use nbconsole_core::monitor::{
    DEFAULT_PAGE_SIZE, DownloadAvailability, Page, StatusFilter, TaskFilter, TaskQuery,
    download_availability,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use super::print_notification;
use crate::config::Config;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks once
    List(QueryArgs),
    /// Show task details and logs
    Show {
        /// Request ID returned at submission
        request_id: Uuid,
    },
    /// Get the server-side status summary of a task
    Status {
        /// Request ID returned at submission
        request_id: Uuid,
    },
    /// Poll the task list and keep the view up to date
    Watch {
        #[command(flatten)]
        query: QueryArgs,

        /// Seconds between automatic refreshes
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,

        /// Start with automatic refresh suspended
        #[arg(long)]
        no_auto_refresh: bool,
    },
    /// Download the output artifact of a successful task
    Download {
        /// Request ID returned at submission
        request_id: Uuid,

        /// Directory to write the artifact into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Try even when the download window looks expired
        #[arg(long)]
        force: bool,
    },
}

/// Filter and paging flags shared by `list` and `watch`
#[derive(Args, Clone)]
pub struct QueryArgs {
    /// Case-insensitive text matched against request ID, pipeline and version
    #[arg(short, long, default_value = "")]
    search: String,

    /// PENDING, STARTED, SUCCESS, FAILURE or ALL
    #[arg(long, default_value = "ALL")]
    status: StatusFilter,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Page to show
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Tasks per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

impl QueryArgs {
    fn into_query(self) -> TaskQuery {
        let mut query = TaskQuery::new(self.page_size);
        query.set_filter(TaskFilter {
            search: self.search,
            status: self.status,
            from: self.from,
            to: self.to,
        });
        query.set_page(self.page);
        query
    }
}

/// Handle task commands
///
/// Routes task subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The task command to execute
/// * `config` - The CLI configuration
pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    let client = config.api_client()?;

    match command {
        TaskCommands::List(query) => list_tasks(&client, query.into_query()).await,
        TaskCommands::Show { request_id } => show_task(&client, request_id).await,
        TaskCommands::Status { request_id } => task_status(&client, request_id).await,
        TaskCommands::Watch {
            query,
            interval,
            no_auto_refresh,
        } => {
            watch_tasks(
                client,
                query.into_query(),
                Duration::from_secs(interval.max(1)),
                !no_auto_refresh,
            )
            .await
        }
        TaskCommands::Download {
            request_id,
            output,
            force,
        } => download_output(&client, request_id, output, force).await,
    }
}

/// Fetch once and print one page
async fn list_tasks(client: &ApiClient, mut query: TaskQuery) -> Result<()> {
    let tasks = client.list_tasks().await.context("Failed to fetch tasks")?;
    let page = query.apply(&tasks);

    print_task_page(&page, Utc::now());

    Ok(())
}

/// Show a single task with its logs
async fn show_task(client: &ApiClient, request_id: Uuid) -> Result<()> {
    let tasks = client.list_tasks().await.context("Failed to fetch tasks")?;
    let task = tasks
        .iter()
        .find(|t| t.request_id == request_id)
        .ok_or_else(|| anyhow::anyhow!("Task {} is not among the recent tasks", request_id))?;

    print_task_details(task, Utc::now());

    Ok(())
}

/// Print the status summary served by the API
async fn task_status(client: &ApiClient, request_id: Uuid) -> Result<()> {
    let report = match client.get_task_status(request_id).await {
        Ok(report) => report,
        Err(e) if e.is_not_found() => anyhow::bail!("No task with request ID {}", request_id),
        Err(e) => return Err(e).context("Failed to fetch task status"),
    };

    println!("{}", "Task Status:".bold());
    println!("  Request ID:  {}", request_id.to_string().cyan());
    println!("  Status:      {}", colorize_status(&report.status));
    println!("  Retries:     {}", report.retry_count);
    if let Some(output_type) = &report.output_type {
        println!("  Output:      {}", output_type);
    }
    if let Some(error) = &report.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    Ok(())
}

/// Download a task's artifact into `output`
///
/// The three-hour window is checked locally first; the server still has the
/// final say, which `--force` defers to.
async fn download_output(
    client: &ApiClient,
    request_id: Uuid,
    output: PathBuf,
    force: bool,
) -> Result<()> {
    let task = match client.list_tasks().await {
        Ok(tasks) => tasks.into_iter().find(|t| t.request_id == request_id),
        Err(e) => {
            print_notification(format!("Could not check task before download: {}", e));
            None
        }
    };

    if let Some(task) = &task {
        match download_availability(task, Utc::now()) {
            DownloadAvailability::Available { .. } => {}
            DownloadAvailability::Expired if !force => {
                anyhow::bail!("Output of {} has expired (finished more than 3 hours ago)", request_id)
            }
            DownloadAvailability::Unavailable if !force => {
                anyhow::bail!("Output of {} is not available (status {})", request_id, task.status)
            }
            _ => print_notification("Download window check bypassed with --force"),
        }
    }

    let bytes = client
        .download_output(request_id)
        .await
        .context("Failed to download output")?;

    let extension = task
        .as_ref()
        .and_then(|t| t.output_type.as_ref())
        .map(|o| o.extension().to_string())
        .unwrap_or_else(|| "bin".to_string());
    tokio::fs::create_dir_all(&output)
        .await
        .with_context(|| format!("Failed to create directory: {}", output.display()))?;
    let path = output.join(format!("{}.{}", request_id, extension));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    println!("{}", "✓ Output downloaded successfully!".green().bold());
    println!("  File:  {}", path.display().to_string().cyan());
    println!("  Size:  {} bytes", bytes.len());

    Ok(())
}

/// Input accepted while watching
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchInput {
    NextPage,
    PrevPage,
    GoTo(usize),
    Search(String),
    Status(StatusFilter),
    From(Option<NaiveDate>),
    To(Option<NaiveDate>),
    ToggleAutoRefresh,
    Refresh,
    Help,
    Quit,
}

const WATCH_HELP: &str = "n/p next/previous page · g N go to page · /TEXT search (/ clears) · \
s STATUS · from DATE|- · to DATE|- · a toggle auto-refresh · r refresh · q quit";

fn parse_watch_input(line: &str) -> Result<WatchInput, String> {
    let line = line.trim();
    if let Some(text) = line.strip_prefix('/') {
        return Ok(WatchInput::Search(text.trim().to_string()));
    }

    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let date = |raw: &str| -> Result<Option<NaiveDate>, String> {
        if raw == "-" || raw.is_empty() {
            Ok(None)
        } else {
            raw.parse()
                .map(Some)
                .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", raw))
        }
    };

    match word {
        "n" => Ok(WatchInput::NextPage),
        "p" => Ok(WatchInput::PrevPage),
        "g" => rest
            .parse()
            .map(WatchInput::GoTo)
            .map_err(|_| format!("invalid page '{}'", rest)),
        "s" => rest.parse().map(WatchInput::Status),
        "from" => date(rest).map(WatchInput::From),
        "to" => date(rest).map(WatchInput::To),
        "a" => Ok(WatchInput::ToggleAutoRefresh),
        "r" | "" => Ok(WatchInput::Refresh),
        "h" | "?" => Ok(WatchInput::Help),
        "q" => Ok(WatchInput::Quit),
        other => Err(format!("unknown command '{}'", other)),
    }
}

/// Poll and re-render until interrupted
///
/// Every filter or page change re-renders the last snapshot right away and
/// asks for a fresh fetch.
async fn watch_tasks(
    client: ApiClient,
    mut query: TaskQuery,
    interval: Duration,
    auto_refresh: bool,
) -> Result<()> {
    let mut monitor = TaskMonitor::spawn(Arc::new(client), interval, auto_refresh);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut snapshot: Vec<Task> = Vec::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    println!("{}", WATCH_HELP.dimmed());

    loop {
        tokio::select! {
            event = monitor.next_event() => match event {
                Some(MonitorEvent::Snapshot(tasks)) => {
                    snapshot = tasks;
                    render_watch(&mut query, &snapshot, monitor.auto_refresh());
                }
                Some(MonitorEvent::FetchFailed(message)) => {
                    print_notification(format!("Refresh failed: {}", message));
                }
                None => break,
            },
            line = stdin.next_line(), if stdin_open => {
                // Without input the view keeps polling until Ctrl-C
                let Some(line) = line.context("Failed to read input")? else {
                    stdin_open = false;
                    continue;
                };
                match parse_watch_input(&line) {
                    Ok(WatchInput::Quit) => break,
                    Ok(WatchInput::Help) => println!("{}", WATCH_HELP.dimmed()),
                    Ok(WatchInput::Refresh) => monitor.refresh(),
                    Ok(WatchInput::ToggleAutoRefresh) => {
                        let enabled = !monitor.auto_refresh();
                        monitor.set_auto_refresh(enabled);
                        println!(
                            "{}",
                            format!("Auto-refresh {}", if enabled { "on" } else { "off" }).dimmed()
                        );
                    }
                    Ok(input) => {
                        apply_watch_input(&mut query, input);
                        render_watch(&mut query, &snapshot, monitor.auto_refresh());
                        monitor.refresh();
                    }
                    Err(message) => print_notification(message),
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    monitor.shutdown().await;
    Ok(())
}

fn apply_watch_input(query: &mut TaskQuery, input: WatchInput) {
    let mut filter = query.filter().clone();
    match input {
        WatchInput::NextPage => query.set_page(query.page() + 1),
        WatchInput::PrevPage => query.set_page(query.page().saturating_sub(1)),
        WatchInput::GoTo(page) => query.set_page(page),
        WatchInput::Search(text) => {
            filter.search = text;
            query.set_filter(filter);
        }
        WatchInput::Status(status) => {
            filter.status = status;
            query.set_filter(filter);
        }
        WatchInput::From(date) => {
            filter.from = date;
            query.set_filter(filter);
        }
        WatchInput::To(date) => {
            filter.to = date;
            query.set_filter(filter);
        }
        WatchInput::ToggleAutoRefresh | WatchInput::Refresh | WatchInput::Help | WatchInput::Quit => {}
    }
}

fn render_watch(query: &mut TaskQuery, snapshot: &[Task], auto_refresh: bool) {
    let page = query.apply(snapshot);
    println!();
    println!(
        "{} {}",
        format!("Refreshed {}", Local::now().format("%H:%M:%S")).bold(),
        if auto_refresh {
            "(auto-refresh on)".dimmed()
        } else {
            "(auto-refresh off)".yellow()
        }
    );
    print_task_page(&page, Utc::now());
}

/// Print one page of tasks
fn print_task_page(page: &Page<Task>, now: DateTime<Utc>) {
    if page.total_items == 0 {
        println!("{}", "No tasks found.".yellow());
        return;
    }

    println!(
        "{}",
        format!(
            "Page {}/{} · {} task(s):",
            page.page, page.total_pages, page.total_items
        )
        .bold()
    );
    println!();
    for task in &page.items {
        print_task_summary(task, now);
    }
}

/// Print a task summary
fn print_task_summary(task: &Task, now: DateTime<Utc>) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        task.notebook_name.bold(),
        task.version.as_deref().unwrap_or("-").dimmed()
    );
    println!("    Request:  {}", task.request_id.to_string().dimmed());
    println!("    Status:   {}", colorize_status(&task.status));
    println!("    Created:  {}", format_time(Some(task.created_at)).dimmed());
    println!("    Finished: {}", format_time(task.finished_at).dimmed());
    println!("    Output:   {}", describe_download(task, now));
    println!();
}

/// Print detailed task information
fn print_task_details(task: &Task, now: DateTime<Utc>) {
    println!("{}", "Task Details:".bold());
    println!("  Request ID: {}", task.request_id.to_string().cyan());
    println!("  Pipeline:   {}", task.notebook_name.bold());
    println!("  Version:    {}", task.version.as_deref().unwrap_or("-"));
    println!("  Status:     {}", colorize_status(&task.status));
    println!("  Retries:    {}", task.retry_count);
    println!("  Created:    {}", format_time(Some(task.created_at)));
    println!("  Started:    {}", format_time(task.started_at));
    println!("  Finished:   {}", format_time(task.finished_at));
    if let Some(duration) = task.duration() {
        println!("  Duration:   {}s", duration.num_seconds());
    }
    println!("  Output:     {}", describe_download(task, now));
    if let Some(path) = &task.output_path {
        println!("  Path:       {}", path.dimmed());
    }

    if !task.params.is_null() {
        println!("\n{}", "Parameters:".bold());
        match serde_json::to_string_pretty(&task.params) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", task.params),
        }
    }

    if let Some(error) = &task.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    if !task.logs.is_empty() {
        println!("\n{}", "Logs:".bold());
        println!("{}", "─".repeat(80).dimmed());
        for log in &task.logs {
            print_log_entry(log);
        }
        println!("{}", "─".repeat(80).dimmed());
    }
}

/// Print a log entry
fn print_log_entry(log: &TaskLog) {
    println!(
        "{} {}",
        log.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
            .dimmed(),
        log.message
    );
}

fn describe_download(task: &Task, now: DateTime<Utc>) -> ColoredString {
    match download_availability(task, now) {
        DownloadAvailability::Available { expires_at } => format!(
            "{} available until {}",
            task.output_type
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "output".to_string()),
            expires_at.with_timezone(&Local).format("%H:%M")
        )
        .green(),
        DownloadAvailability::Expired => "expired".red(),
        DownloadAvailability::Unavailable => "-".dimmed(),
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Colorize task status for display
fn colorize_status(status: &TaskStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        TaskStatus::Pending => status_str.yellow(),
        TaskStatus::Started => status_str.cyan(),
        TaskStatus::Success => status_str.green(),
        TaskStatus::Failure => status_str.red(),
        TaskStatus::Unknown => status_str.dimmed(),
    }
}
