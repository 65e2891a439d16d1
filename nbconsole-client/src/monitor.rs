//! Task monitor
//!
//! Polls the task list in a background task and hands each snapshot (or
//! failure) to the consumer. Fetches run one at a time on the monitor task;
//! a refresh requested mid-fetch is served right after it. There is no retry
//! or backoff: a failed poll is reported and the next tick supersedes it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nbconsole_core::domain::task::Task;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::ApiClient;

/// Interval between automatic refreshes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const EVENT_BUFFER: usize = 16;

/// Something that can produce the current task list
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    async fn fetch_tasks(&self) -> crate::Result<Vec<Task>>;
}

#[async_trait]
impl TaskSource for ApiClient {
    async fn fetch_tasks(&self) -> crate::Result<Vec<Task>> {
        self.list_tasks().await
    }
}

/// Result of one poll
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Snapshot(Vec<Task>),
    FetchFailed(String),
}

#[derive(Debug)]
enum Command {
    Refresh,
    SetAutoRefresh(bool),
}

/// Handle to a running poller
///
/// Dropping the handle stops the background task.
#[derive(Debug)]
pub struct TaskMonitor {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::Receiver<MonitorEvent>,
    auto_refresh: bool,
    handle: JoinHandle<()>,
}

impl TaskMonitor {
    /// Start polling `source`
    ///
    /// The first fetch happens immediately either way; `auto_refresh` decides
    /// whether further fetches follow every `interval`.
    pub fn spawn<S: TaskSource>(source: Arc<S>, interval: Duration, auto_refresh: bool) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(run(source, interval, auto_refresh, command_rx, event_tx));

        Self {
            commands: command_tx,
            events: event_rx,
            auto_refresh,
            handle,
        }
    }

    /// Fetch now, regardless of the auto-refresh setting
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Enable or suspend timer-driven fetches
    ///
    /// Re-enabling fetches immediately and restarts the interval.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
        let _ = self.commands.send(Command::SetAutoRefresh(enabled));
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// Wait for the next poll result
    ///
    /// Returns `None` once the background task has stopped.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events.recv().await
    }

    /// Stop the background task and wait for it to wind down
    pub async fn shutdown(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for TaskMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run<S: TaskSource>(
    source: Arc<S>,
    interval: Duration,
    mut auto_refresh: bool,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<MonitorEvent>,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if !poll_once(source.as_ref(), &events).await {
        return;
    }

    loop {
        tokio::select! {
            _ = ticker.tick(), if auto_refresh => {
                debug!("Scheduled task refresh");
            }
            command = commands.recv() => match command {
                Some(Command::Refresh) => debug!("Manual task refresh"),
                Some(Command::SetAutoRefresh(enabled)) => {
                    if enabled && !auto_refresh {
                        ticker.reset_immediately();
                    }
                    auto_refresh = enabled;
                    continue;
                }
                None => break,
            },
        }

        if !poll_once(source.as_ref(), &events).await {
            break;
        }
    }
}

/// Fetch and publish one snapshot; `false` once nobody is listening
async fn poll_once<S: TaskSource>(source: &S, events: &mpsc::Sender<MonitorEvent>) -> bool {
    let event = match source.fetch_tasks().await {
        Ok(tasks) => MonitorEvent::Snapshot(tasks),
        Err(e) => {
            warn!("Task poll failed: {}", e);
            MonitorEvent::FetchFailed(e.to_string())
        }
    };

    events.send(event).await.is_ok()
}
