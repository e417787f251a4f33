//! # blockwatch-types
//!
//! Core types for DNS filter monitoring. This crate defines the schema shared
//! between the blockwatch client, the reconciliation engine, and any consumer
//! that renders filter-server state.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: the core types stand on their own
//! - **Optional serialization**: enable the `serde` feature as needed
//! - **Server agnostic**: Works with Blocky or any filter server exposing the
//!   same blocking-control and Prometheus-metrics surfaces
//! - **Versioned snapshots**: Every published snapshot carries a monotonically
//!   increasing version so consumers can cheaply detect change
//!
//! ## Features
//!
//! - `std` (default): standard library support
//! - `serde`: serialization of all types via serde
//!
//! ## Example
//!
//! ```rust
//! use blockwatch_types::{BlockingState, MetricSample, MetricsSnapshot};
//!
//! // Blocking disabled for the "ads" group until the given deadline
//! let blocking = BlockingState::disabled_until(["ads"], 1_703_160_900_000);
//! assert!(!blocking.enabled);
//! assert!(blocking.is_timed());
//!
//! // Metrics are keyed by (name, label set); later inserts win
//! let mut metrics = MetricsSnapshot::new();
//! metrics.insert(MetricSample::new("blocky_query_total", [("client", "lan")], 42.0, 0));
//! metrics.insert(MetricSample::new("blocky_query_total", [("client", "lan")], 43.0, 1));
//! assert_eq!(metrics.sum("blocky_query_total"), Some(43.0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod blocking;
mod duration;
mod metrics;
mod snapshot;

pub use blocking::*;
pub use duration::*;
pub use metrics::*;
pub use snapshot::*;
