//! Periodic summary refresh
//!
//! [`RefreshService`] owns a background task that fetches the combined
//! summary once per interval and broadcasts each batch to every current
//! subscriber. Batches sent while nobody listens are dropped; late
//! subscribers only see later batches.
//!
//! - Errors from a single iteration are logged and the loop keeps going.
//! - [`RefreshService::stop`] or dropping the service cancels the task.

use crate::domain::ChatItem;
use crate::usecases::GetSummary;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const CHANNEL_CAPACITY: usize = 16;

struct RunningLoop {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background loop publishing summaries on a fixed interval
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use cryptomoon::config::Config;
/// use cryptomoon::refresh::RefreshService;
/// use cryptomoon::repository::Repository;
/// use cryptomoon::usecases::GetSummary;
///
/// # async fn example() -> cryptomoon::error::Result<()> {
/// let repository = Arc::new(Repository::from_config(&Config::default())?);
/// let mut service = RefreshService::new(GetSummary::new(repository), Duration::from_secs(60));
/// let mut updates = service.subscribe();
/// service.start();
/// let batch = updates.recv().await?;
/// println!("{} items", batch.len());
/// service.stop();
/// # Ok(())
/// # }
/// ```
pub struct RefreshService {
    get_summary: GetSummary,
    interval: Duration,
    sender: broadcast::Sender<Vec<ChatItem>>,
    running: Option<RunningLoop>,
}

impl RefreshService {
    pub fn new(get_summary: GetSummary, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            get_summary,
            interval,
            sender,
            running: None,
        }
    }

    /// Receive every batch published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<ChatItem>> {
        self.sender.subscribe()
    }

    /// Whether the background loop is active
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|running| !running.handle.is_finished())
            .unwrap_or(false)
    }

    /// Start the loop; a running loop is restarted
    ///
    /// The first refresh happens immediately.
    pub fn start(&mut self) {
        if self.running.is_some() {
            tracing::debug!("Refresh loop already running, restarting");
            self.stop();
        }

        let cancellation = CancellationToken::new();
        let handle = spawn_refresh_loop(
            self.get_summary.clone(),
            self.interval,
            self.sender.clone(),
            cancellation.clone(),
        );
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            "Summary refresh started"
        );
        self.running = Some(RunningLoop {
            cancellation,
            handle,
        });
    }

    /// Cancel the loop if it is running
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancellation.cancel();
            tracing::info!("Summary refresh stopped");
        }
    }
}

impl Drop for RefreshService {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancellation.cancel();
        }
    }
}

fn spawn_refresh_loop(
    get_summary: GetSummary,
    interval: Duration,
    sender: broadcast::Sender<Vec<ChatItem>>,
    cancellation: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                result = get_summary.execute() => result,
            };

            match result {
                Ok(items) => {
                    let count = items.len();
                    match sender.send(items) {
                        Ok(receivers) => {
                            tracing::debug!(items = count, receivers, "Summary published")
                        }
                        Err(_) => tracing::debug!("Summary refreshed with no listeners"),
                    }
                }
                Err(e) => tracing::error!("Summary refresh failed: {}", e),
            }
        }

        tracing::debug!("Refresh loop exited");
    })
}
