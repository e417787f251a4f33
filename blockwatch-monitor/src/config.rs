//! Monitor configuration.

use std::time::Duration;

use blockwatch_client::{DEFAULT_API_PORT, DEFAULT_METRICS_PATH, DEFAULT_TIMEOUT};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Heartbeat publishes happen after this many quiet poll periods.
pub const DEFAULT_HEARTBEAT_FACTOR: u32 = 5;

/// Consecutive status-poll failures before health degrades to unavailable.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Configuration consumed by the reconciliation loop.
///
/// Validation and persistence of these values belong to the embedding
/// application; the monitor takes them as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Filter server hostname.
    pub host: String,
    /// Control-API port.
    pub api_port: u16,
    /// Whether to scrape the Prometheus endpoint each cycle.
    pub prometheus_enabled: bool,
    /// Prometheus port (often shared with the control API).
    pub prometheus_port: u16,
    /// Prometheus exposition path.
    pub prometheus_path: String,
    /// Period between poll cycles.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Quiet interval after which an unchanged snapshot is republished to
    /// signal liveness.
    pub heartbeat_interval: Duration,
    /// Consecutive failures before the snapshot reports unavailable.
    pub failure_threshold: u32,
}

impl MonitorConfig {
    /// Create a builder for the given host.
    pub fn builder(host: impl Into<String>) -> MonitorConfigBuilder {
        MonitorConfigBuilder {
            host: host.into(),
            ..MonitorConfigBuilder::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig::builder("localhost").build()
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    host: String,
    api_port: Option<u16>,
    prometheus_enabled: bool,
    prometheus_port: Option<u16>,
    prometheus_path: Option<String>,
    poll_interval: Option<Duration>,
    timeout: Option<Duration>,
    heartbeat_interval: Option<Duration>,
    failure_threshold: Option<u32>,
}

impl MonitorConfigBuilder {
    /// Set the control-API port (default: 4000).
    pub fn api_port(mut self, port: u16) -> Self {
        self.api_port = Some(port);
        self
    }

    /// Enable metrics scraping on the given port.
    pub fn prometheus(mut self, port: u16) -> Self {
        self.prometheus_enabled = true;
        self.prometheus_port = Some(port);
        self
    }

    /// Set the exposition path (default: "/metrics").
    pub fn prometheus_path(mut self, path: impl Into<String>) -> Self {
        self.prometheus_path = Some(path.into());
        self
    }

    /// Set the poll period (default: 30 seconds).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the heartbeat interval (default: 5x the poll period).
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Override the failure threshold (default: 3).
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MonitorConfig {
        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        MonitorConfig {
            host: if self.host.is_empty() {
                "localhost".to_string()
            } else {
                self.host
            },
            api_port: self.api_port.unwrap_or(DEFAULT_API_PORT),
            prometheus_enabled: self.prometheus_enabled,
            prometheus_port: self.prometheus_port.unwrap_or(DEFAULT_API_PORT),
            prometheus_path: self
                .prometheus_path
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string()),
            poll_interval,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            heartbeat_interval: self
                .heartbeat_interval
                .unwrap_or(poll_interval * DEFAULT_HEARTBEAT_FACTOR),
            failure_threshold: self.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::builder("dns.local").build();
        assert_eq!(config.host, "dns.local");
        assert_eq!(config.api_port, 4000);
        assert!(!config.prometheus_enabled);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(150));
        assert_eq!(config.failure_threshold, 3);
    }

    #[test]
    fn heartbeat_follows_custom_poll_interval() {
        let config = MonitorConfig::builder("h")
            .poll_interval(Duration::from_secs(10))
            .build();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(50));
    }

    #[test]
    fn explicit_heartbeat_wins() {
        let config = MonitorConfig::builder("h")
            .poll_interval(Duration::from_secs(10))
            .heartbeat_interval(Duration::from_secs(120))
            .build();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(120));
    }

    #[test]
    fn prometheus_settings() {
        let config = MonitorConfig::builder("h")
            .prometheus(9100)
            .prometheus_path("/custom")
            .build();
        assert!(config.prometheus_enabled);
        assert_eq!(config.prometheus_port, 9100);
        assert_eq!(config.prometheus_path, "/custom");
    }

    #[test]
    fn empty_host_falls_back_to_localhost() {
        let config = MonitorConfig::builder("").build();
        assert_eq!(config.host, "localhost");
    }
}
