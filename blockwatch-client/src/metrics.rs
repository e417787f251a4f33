//! Fetching and parsing the filter server's Prometheus endpoint.

use std::sync::Arc;
use std::time::Duration;

use crate::control::{DEFAULT_API_PORT, DEFAULT_TIMEOUT};
use crate::error::{ControlError, MetricsError};
use crate::exposition::{parse_metrics, ParsedMetrics};
use crate::transport::{HttpTransport, Transport};

/// Default path of the Prometheus exposition endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Client for the metrics endpoint, typically served on the same host as
/// the control API but on its own port and path.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    transport: Arc<dyn Transport>,
    url: String,
    timeout: Duration,
}

impl MetricsClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> MetricsClientBuilder {
        MetricsClientBuilder::default()
    }

    /// Fetch the raw exposition text.
    pub async fn fetch(&self) -> Result<String, ControlError> {
        let response = self.transport.get(&self.url, self.timeout).await?;
        if !response.is_success() {
            return Err(ControlError::Unexpected(format!(
                "metrics endpoint returned HTTP {}",
                response.status
            )));
        }
        String::from_utf8(response.body)
            .map_err(|_| ControlError::Unexpected("metrics body is not valid UTF-8".into()))
    }

    /// Fetch and parse one scrape, stamping samples with the poll time.
    pub async fn collect(&self, timestamp_ms: u64) -> Result<ParsedMetrics, MetricsError> {
        let text = self.fetch().await?;
        Ok(parse_metrics(&text, timestamp_ms)?)
    }
}

/// Builder for [`MetricsClient`].
#[derive(Debug, Default)]
pub struct MetricsClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl MetricsClientBuilder {
    /// Set the filter server hostname (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the Prometheus port (default: 4000, shared with the control API).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the exposition path (default: "/metrics").
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Inject a custom transport (default: a fresh [`HttpTransport`]).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> MetricsClient {
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(DEFAULT_API_PORT);
        let path = self
            .path
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
        MetricsClient {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            url: format!("http://{}:{}{}", host, port, path),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let client = MetricsClient::builder().build();
        assert_eq!(client.url, "http://localhost:4000/metrics");
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_custom() {
        let client = MetricsClient::builder()
            .host("dns.local")
            .port(9100)
            .path("/custom-metrics")
            .timeout(Duration::from_secs(2))
            .build();
        assert_eq!(client.url, "http://dns.local:9100/custom-metrics");
        assert_eq!(client.timeout, Duration::from_secs(2));
    }
}
