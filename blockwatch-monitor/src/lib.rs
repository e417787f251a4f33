//! # blockwatch-monitor
//!
//! Polling and reconciliation engine for a Blocky-style DNS filter server.
//!
//! The monitor keeps a local, consistent view of the server: it periodically
//! fetches blocking status and Prometheus metrics, owns the client-side
//! "auto re-enable" timer the server itself does not track, and publishes a
//! versioned, immutable [`Snapshot`] that any number of readers can consume
//! concurrently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockwatch_monitor::{Monitor, MonitorConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::builder("dns.local")
//!         .prometheus(4000)
//!         .poll_interval(Duration::from_secs(30))
//!         .build();
//!
//!     let handle = Monitor::new(config).start();
//!
//!     // Pause blocking for 15 minutes; the monitor re-enables it when
//!     // the duration elapses, even if the server forgets.
//!     handle.disable_for(Duration::from_secs(15 * 60)).await?;
//!
//!     let snapshot = handle.snapshot();
//!     println!("blocking enabled: {}", snapshot.blocking.enabled);
//!     Ok(())
//! }
//! ```
//!
//! ## Division of authority
//!
//! The server is authoritative for *whether* blocking is enabled and which
//! groups are disabled; the monitor is authoritative for *when* a timed
//! disable should end. Each poll cycle reconciles the two: a server-side
//! enable collapses the local timer, while a missed deadline is retried on
//! the next successful contact rather than dropped.
//!
//! ## Failure model
//!
//! Fetch failures never stop the loop or surface as panics; they degrade the
//! published snapshot's health fields and are retried on the normal cadence.
//! Only user-initiated commands report their errors synchronously.

mod command;
mod config;
mod reconcile;
mod store;
mod timer;

pub use command::MonitorHandle;
pub use config::{
    MonitorConfig, MonitorConfigBuilder, DEFAULT_FAILURE_THRESHOLD, DEFAULT_HEARTBEAT_FACTOR,
    DEFAULT_POLL_INTERVAL,
};
pub use reconcile::Monitor;
pub use store::SnapshotStore;
pub use timer::BlockingTimer;

// Re-export the types consumers handle through this crate's API
pub use blockwatch_client::{ControlError, QueryResponse, ServerStatus, Transport};
pub use blockwatch_types::{
    BlockingState, ErrorKind, Health, MetricKind, MetricSample, MetricsSnapshot, Snapshot,
};
