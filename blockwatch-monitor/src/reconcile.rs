//! The reconciliation loop.
//!
//! One poll cycle fetches control status and metrics concurrently, feeds the
//! status into the blocking timer, fires the auto re-enable when its deadline
//! has passed, and publishes a new snapshot version when anything changed.
//! Fetch failures degrade the published health fields; they never stop the
//! loop.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use blockwatch_client::{ControlClient, HttpTransport, MetricsClient, Transport};
use blockwatch_types::{ErrorKind, Health, MetricsSnapshot, Snapshot};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::command::{Command, MonitorHandle};
use crate::config::MonitorConfig;
use crate::store::SnapshotStore;
use crate::timer::BlockingTimer;

/// Capacity of the control-command queue.
const COMMAND_BUFFER: usize = 16;

/// The polling and reconciliation engine.
///
/// Construct with a configuration, then call [`start`](Monitor::start) to
/// spawn the loop and obtain a [`MonitorHandle`] for snapshots and commands.
///
/// # Example
///
/// ```rust,no_run
/// use blockwatch_monitor::{Monitor, MonitorConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = MonitorConfig::builder("dns.local").prometheus(4000).build();
///     let handle = Monitor::new(config).start();
///
///     let mut updates = handle.subscribe();
///     while updates.changed().await.is_ok() {
///         let snapshot = updates.borrow().clone();
///         println!("v{}: blocking enabled = {}", snapshot.version, snapshot.blocking.enabled);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Monitor {
    config: MonitorConfig,
    control: ControlClient,
    metrics: Option<MetricsClient>,
    store: Arc<SnapshotStore>,
    timer: BlockingTimer,
    consecutive_failures: u32,
    last_error: Option<ErrorKind>,
    last_success_ms: Option<u64>,
    last_publish_ms: u64,
}

impl Monitor {
    /// Create a monitor using the production HTTP transport.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Create a monitor with an injected transport.
    pub fn with_transport(config: MonitorConfig, transport: Arc<dyn Transport>) -> Self {
        let control = ControlClient::builder()
            .host(&config.host)
            .port(config.api_port)
            .timeout(config.timeout)
            .transport(transport.clone())
            .build();

        let metrics = config.prometheus_enabled.then(|| {
            MetricsClient::builder()
                .host(&config.host)
                .port(config.prometheus_port)
                .path(&config.prometheus_path)
                .timeout(config.timeout)
                .transport(transport)
                .build()
        });

        Self {
            config,
            control,
            metrics,
            store: Arc::new(SnapshotStore::new()),
            timer: BlockingTimer::new(),
            consecutive_failures: 0,
            last_error: None,
            last_success_ms: None,
            last_publish_ms: 0,
        }
    }

    /// The store this monitor publishes into.
    pub fn store(&self) -> Arc<SnapshotStore> {
        self.store.clone()
    }

    /// Spawn the poll loop and return a handle to it.
    ///
    /// The first cycle runs immediately, then every poll interval. The loop
    /// survives any fetch failure and runs until the handle stops it or all
    /// handles are dropped.
    pub fn start(mut self) -> MonitorHandle {
        let (commands_tx, mut commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = MonitorHandle::new(commands_tx, self.store.clone(), Arc::new(stop_tx));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cycle(epoch_ms()).await;
                    }
                    command = commands_rx.recv() => match command {
                        Some(command) => self.apply_command(command, epoch_ms()).await,
                        // All handles dropped: nobody is left to read us.
                        None => break,
                    },
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("monitor loop stopped");
        });

        handle
    }

    /// Execute one reconciliation cycle at the given wall-clock time.
    async fn run_cycle(&mut self, now_ms: u64) {
        let status_fut = self.control.status();
        let metrics_fut = async {
            match &self.metrics {
                Some(client) => Some(client.collect(now_ms).await),
                None => None,
            }
        };
        // Both fetches run concurrently so a cycle lasts at most one
        // timeout, not the sum of two.
        let (status_result, metrics_result) = tokio::join!(status_fut, metrics_fut);

        let mut cycle_error = None;

        match status_result {
            Ok(status) => {
                self.timer.apply_status(&status, now_ms);
                self.consecutive_failures = 0;
                self.last_success_ms = Some(now_ms);

                if self.timer.auto_enable_due(now_ms) {
                    match self.control.enable().await {
                        Ok(()) => {
                            info!("disable duration elapsed, blocking re-enabled");
                            self.timer.enable();
                        }
                        Err(e) => {
                            // The obligation stands; retried next cycle.
                            warn!(error = %e, "auto re-enable failed, will retry");
                            cycle_error = Some(e.kind());
                        }
                    }
                }
            }
            Err(e) => {
                self.consecutive_failures += 1;
                cycle_error = Some(e.kind());
                if self.consecutive_failures >= self.config.failure_threshold {
                    error!(
                        error = %e,
                        failures = self.consecutive_failures,
                        "status poll failing repeatedly, marking unavailable"
                    );
                } else {
                    warn!(error = %e, "status poll failed");
                }
            }
        }

        let fresh_metrics = match metrics_result {
            Some(Ok(parsed)) => {
                if parsed.skipped > 0 {
                    warn!(skipped = parsed.skipped, "dropped malformed metric lines");
                }
                Some(parsed.snapshot)
            }
            Some(Err(e)) => {
                // Independent of the status fetch: blocking state still
                // updates, the metrics portion just stays stale.
                warn!(error = %e, "metrics collection failed, keeping previous samples");
                cycle_error = cycle_error.or(Some(e.kind()));
                None
            }
            None => None,
        };

        self.last_error = cycle_error;
        self.publish_if_needed(now_ms, fresh_metrics);
    }

    /// Apply a queued control command between cycles.
    ///
    /// Results go back to the caller synchronously; rejected commands are
    /// not retried and do not count against poll health.
    async fn apply_command(&mut self, command: Command, now_ms: u64) {
        match command {
            Command::Enable { reply } => {
                let result = self.control.enable().await;
                if result.is_ok() {
                    self.timer.enable();
                    self.publish_if_needed(now_ms, None);
                }
                let _ = reply.send(result);
            }
            Command::Disable {
                groups,
                duration,
                reply,
            } => {
                let result = self.control.disable(&groups, duration).await;
                if result.is_ok() {
                    self.timer.disable(groups, duration, now_ms);
                    self.publish_if_needed(now_ms, None);
                }
                let _ = reply.send(result);
            }
            Command::RefreshLists { reply } => {
                let result = self.control.refresh_lists().await;
                if result.is_ok() {
                    info!("blocking lists refreshed");
                }
                let _ = reply.send(result);
            }
            Command::FlushCache { reply } => {
                let result = self.control.flush_cache().await;
                if result.is_ok() {
                    info!("server DNS cache flushed");
                }
                let _ = reply.send(result);
            }
            Command::Query { name, qtype, reply } => {
                let _ = reply.send(self.control.query(&name, &qtype).await);
            }
        }
    }

    /// Publish a new snapshot version if content changed or the heartbeat
    /// interval elapsed without one.
    fn publish_if_needed(&mut self, now_ms: u64, fresh_metrics: Option<MetricsSnapshot>) {
        let current = self.store.current();
        let blocking = self.timer.blocking_state();
        let metrics = fresh_metrics.unwrap_or_else(|| current.metrics.clone());
        let health = if self.last_success_ms.is_none()
            || self.consecutive_failures >= self.config.failure_threshold
        {
            Health::Unavailable
        } else {
            Health::Healthy
        };

        // Samples are re-stamped with the poll time on every scrape; only
        // the reported facts count as change.
        let changed = blocking != current.blocking
            || !metrics.content_eq(&current.metrics)
            || health != current.health
            || self.last_error != current.last_error;
        let heartbeat_due = now_ms.saturating_sub(self.last_publish_ms)
            >= self.config.heartbeat_interval.as_millis() as u64;

        if !changed && !heartbeat_due {
            return;
        }

        let snapshot = Snapshot {
            version: current.version + 1,
            blocking,
            metrics,
            last_success_ms: self.last_success_ms,
            last_error: self.last_error,
            consecutive_failures: self.consecutive_failures,
            health,
        };
        debug!(version = snapshot.version, changed, "publishing snapshot");
        self.last_publish_ms = now_ms;
        self.store.publish(snapshot);
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
