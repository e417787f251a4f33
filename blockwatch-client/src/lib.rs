//! # blockwatch-client
//!
//! Typed access to a Blocky-style DNS filter server: the blocking control
//! API (enable, disable-for-duration, list refresh, cache flush, test
//! queries) and the Prometheus metrics endpoint.
//!
//! Requests go through the injected [`Transport`] trait, so the reconciler
//! and the test suite can swap in fakes; [`HttpTransport`] is the
//! reqwest-backed production implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockwatch_client::{ControlClient, MetricsClient};
//! use std::collections::BTreeSet;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let control = ControlClient::builder().host("dns.local").build();
//!
//!     // Pause blocking for five minutes
//!     control.disable(&BTreeSet::new(), Some(Duration::from_secs(300))).await?;
//!
//!     // Scrape and parse the metrics endpoint
//!     let metrics = MetricsClient::builder().host("dns.local").build();
//!     let parsed = metrics.collect(0).await?;
//!     println!("{} samples", parsed.snapshot.len());
//!     Ok(())
//! }
//! ```

mod control;
mod error;
mod exposition;
mod metrics;
mod transport;

pub use control::{
    ControlClient, ControlClientBuilder, QueryResponse, ServerStatus, DEFAULT_API_PORT,
    DEFAULT_TIMEOUT,
};
pub use error::{ControlError, MetricsError, ParseError};
pub use exposition::{parse_metrics, ParsedMetrics};
pub use metrics::{MetricsClient, MetricsClientBuilder, DEFAULT_METRICS_PATH};
pub use transport::{HttpTransport, RawResponse, Transport};

// Re-export types for convenience
pub use blockwatch_types::{MetricKind, MetricSample, MetricsSnapshot};
