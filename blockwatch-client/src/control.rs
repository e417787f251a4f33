//! Typed client for the filter server's control API.
//!
//! Operations map 1:1 to control endpoints; none of them retry internally.
//! Retry policy belongs to the reconciliation loop driving this client.
//!
//! ## Example
//!
//! ```rust,no_run
//! use blockwatch_client::ControlClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ControlClient::builder()
//!         .host("dns.local")
//!         .port(4000)
//!         .timeout(Duration::from_secs(10))
//!         .build();
//!
//!     let status = client.status().await?;
//!     if !status.enabled {
//!         client.enable().await?;
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use blockwatch_types::format_duration;

use crate::error::ControlError;
use crate::transport::{HttpTransport, RawResponse, Transport};

/// Default control-API port of the filter server.
pub const DEFAULT_API_PORT: u16 = 4000;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Multiplier applied to the timeout for list refreshes, which re-download
/// every denylist source and routinely outlast a normal request.
const REFRESH_TIMEOUT_FACTOR: u32 = 3;

/// Blocking status as reported by the server.
///
/// The server is authoritative for `enabled` and `disabled_groups`.
/// `auto_enable_in_sec` is present only when the server itself tracks a
/// pending re-enable; most deployments leave timing to the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// Whether blocking is currently active.
    pub enabled: bool,

    /// Seconds until the server re-enables blocking on its own, when known.
    /// Zero means no server-side timer is pending.
    #[serde(default)]
    pub auto_enable_in_sec: Option<u64>,

    /// Groups currently excluded from blocking. The server may send this as
    /// `null` or omit it entirely; both collapse to the empty set.
    #[serde(default, deserialize_with = "groups_or_empty")]
    pub disabled_groups: BTreeSet<String>,
}

/// Outcome of a DNS test query issued through the control API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Why the server answered the way it did, e.g. `BLOCKED (ads)`.
    #[serde(default)]
    pub reason: String,

    /// The textual answer section.
    #[serde(default)]
    pub response: String,

    /// Response classification, e.g. `RESOLVED`, `BLOCKED`, `CACHED`.
    #[serde(default)]
    pub response_type: String,

    /// DNS return code, e.g. `NOERROR`, `NXDOMAIN`.
    #[serde(default)]
    pub return_code: String,
}

/// Accept a missing, `null`, or non-array `disabledGroups` field as empty;
/// filter servers have been observed emitting all three.
fn groups_or_empty<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => BTreeSet::new(),
    })
}

/// Thin typed wrapper over the control endpoints.
#[derive(Debug, Clone)]
pub struct ControlClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl ControlClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> ControlClientBuilder {
        ControlClientBuilder::default()
    }

    /// Fetch the authoritative blocking status.
    pub async fn status(&self) -> Result<ServerStatus, ControlError> {
        let url = format!("{}/blocking/status", self.base_url);
        let response = self.transport.get(&url, self.timeout).await?;
        if !response.is_success() {
            return Err(ControlError::Unexpected(format!(
                "status endpoint returned HTTP {}",
                response.status
            )));
        }
        parse_status(&response.body)
    }

    /// Enable blocking.
    pub async fn enable(&self) -> Result<(), ControlError> {
        let url = format!("{}/blocking/enable", self.base_url);
        let response = self.transport.get(&url, self.timeout).await?;
        ack(response)
    }

    /// Disable blocking, optionally for specific groups and/or a bounded
    /// duration. An empty group set disables all blocking.
    pub async fn disable(
        &self,
        groups: &BTreeSet<String>,
        duration: Option<Duration>,
    ) -> Result<(), ControlError> {
        let url = self.disable_url(groups, duration);
        let response = self.transport.get(&url, self.timeout).await?;
        ack(response)
    }

    /// Trigger a refresh of all blocking lists. Allowed a longer deadline
    /// than other operations.
    pub async fn refresh_lists(&self) -> Result<(), ControlError> {
        let url = format!("{}/lists/refresh", self.base_url);
        let timeout = self.timeout * REFRESH_TIMEOUT_FACTOR;
        let response = self.transport.post(&url, None, timeout).await?;
        ack(response)
    }

    /// Flush the server's DNS cache.
    pub async fn flush_cache(&self) -> Result<(), ControlError> {
        let url = format!("{}/cache/flush", self.base_url);
        let response = self.transport.post(&url, None, self.timeout).await?;
        ack(response)
    }

    /// Resolve a name through the filter, reporting how it would be handled.
    pub async fn query(&self, name: &str, qtype: &str) -> Result<QueryResponse, ControlError> {
        let url = format!("{}/query", self.base_url);
        let body = serde_json::json!({ "query": name, "type": qtype });
        let response = self.transport.post(&url, Some(body), self.timeout).await?;
        if !response.is_success() {
            return Err(ControlError::ServerRejected {
                status: response.status,
            });
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| ControlError::Unexpected(format!("malformed query response: {e}")))
    }

    fn disable_url(&self, groups: &BTreeSet<String>, duration: Option<Duration>) -> String {
        let mut url = format!("{}/blocking/disable", self.base_url);
        let mut params = Vec::new();
        if let Some(d) = duration {
            params.push(format!("duration={}", format_duration(d)));
        }
        if !groups.is_empty() {
            let joined: Vec<&str> = groups.iter().map(String::as_str).collect();
            params.push(format!("groups={}", joined.join(",")));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }
}

fn parse_status(body: &[u8]) -> Result<ServerStatus, ControlError> {
    serde_json::from_slice(body)
        .map_err(|e| ControlError::Unexpected(format!("malformed status body: {e}")))
}

fn ack(response: RawResponse) -> Result<(), ControlError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ControlError::ServerRejected {
            status: response.status,
        })
    }
}

/// Builder for [`ControlClient`].
#[derive(Debug, Default)]
pub struct ControlClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ControlClientBuilder {
    /// Set the filter server hostname (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the control-API port (default: 4000).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
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
    pub fn build(self) -> ControlClient {
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(DEFAULT_API_PORT);
        ControlClient {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            base_url: format!("http://{}:{}/api", host, port),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let client = ControlClient::builder().build();
        assert_eq!(client.base_url, "http://localhost:4000/api");
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_custom() {
        let client = ControlClient::builder()
            .host("dns.local")
            .port(4001)
            .timeout(Duration::from_secs(3))
            .build();
        assert_eq!(client.base_url, "http://dns.local:4001/api");
        assert_eq!(client.timeout, Duration::from_secs(3));
    }

    #[test]
    fn parse_status_full_payload() {
        let body = br#"{"enabled":false,"autoEnableInSec":120,"disabledGroups":["ads","kids"]}"#;
        let status = parse_status(body).unwrap();
        assert!(!status.enabled);
        assert_eq!(status.auto_enable_in_sec, Some(120));
        assert_eq!(status.disabled_groups.len(), 2);
        assert!(status.disabled_groups.contains("ads"));
    }

    #[test]
    fn parse_status_minimal_payload() {
        let status = parse_status(br#"{"enabled":true}"#).unwrap();
        assert!(status.enabled);
        assert_eq!(status.auto_enable_in_sec, None);
        assert!(status.disabled_groups.is_empty());
    }

    #[test]
    fn parse_status_null_groups() {
        let status = parse_status(br#"{"enabled":false,"disabledGroups":null}"#).unwrap();
        assert!(status.disabled_groups.is_empty());
    }

    #[test]
    fn parse_status_non_array_groups() {
        let status = parse_status(br#"{"enabled":false,"disabledGroups":"ads"}"#).unwrap();
        assert!(status.disabled_groups.is_empty());
    }

    #[test]
    fn parse_status_malformed_body_is_protocol_error() {
        let err = parse_status(b"<html>502</html>").unwrap_err();
        assert_eq!(err.kind(), blockwatch_types::ErrorKind::Protocol);
    }

    #[test]
    fn disable_url_without_params() {
        let client = ControlClient::builder().build();
        assert_eq!(
            client.disable_url(&BTreeSet::new(), None),
            "http://localhost:4000/api/blocking/disable"
        );
    }

    #[test]
    fn disable_url_with_duration() {
        let client = ControlClient::builder().build();
        assert_eq!(
            client.disable_url(&BTreeSet::new(), Some(Duration::from_secs(300))),
            "http://localhost:4000/api/blocking/disable?duration=5m"
        );
    }

    #[test]
    fn disable_url_with_groups_and_duration() {
        let client = ControlClient::builder().build();
        let groups: BTreeSet<String> = ["kids", "ads"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            client.disable_url(&groups, Some(Duration::from_secs(3600))),
            "http://localhost:4000/api/blocking/disable?duration=1h&groups=ads,kids"
        );
    }

    #[test]
    fn ack_maps_failure_to_rejection() {
        let ok = RawResponse {
            status: 200,
            body: Vec::new(),
        };
        assert!(ack(ok).is_ok());

        let err = ack(RawResponse {
            status: 503,
            body: Vec::new(),
        })
        .unwrap_err();
        match err {
            ControlError::ServerRejected { status } => assert_eq!(status, 503),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn query_response_tolerates_missing_fields() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"returnCode":"NOERROR"}"#).unwrap();
        assert_eq!(response.return_code, "NOERROR");
        assert_eq!(response.reason, "");
    }

    /// Records every request and answers 200 with an empty body.
    #[derive(Debug, Default)]
    struct RecordingTransport {
        requests: std::sync::Mutex<Vec<(String, String, Duration)>>,
    }

    impl RecordingTransport {
        fn requests(&self) -> Vec<(String, String, Duration)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, ControlError> {
            self.requests
                .lock()
                .unwrap()
                .push(("GET".into(), url.into(), timeout));
            Ok(RawResponse {
                status: 200,
                body: br#"{"enabled":true}"#.to_vec(),
            })
        }

        async fn post(
            &self,
            url: &str,
            _json: Option<serde_json::Value>,
            timeout: Duration,
        ) -> Result<RawResponse, ControlError> {
            self.requests
                .lock()
                .unwrap()
                .push(("POST".into(), url.into(), timeout));
            Ok(RawResponse {
                status: 200,
                body: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn operations_hit_their_endpoints_with_expected_methods() {
        let transport = Arc::new(RecordingTransport::default());
        let client = ControlClient::builder()
            .transport(transport.clone())
            .build();

        client.status().await.unwrap();
        client.enable().await.unwrap();
        client.flush_cache().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].0, "GET");
        assert_eq!(requests[0].1, "http://localhost:4000/api/blocking/status");
        assert_eq!(requests[1].1, "http://localhost:4000/api/blocking/enable");
        assert_eq!(requests[2].0, "POST");
        assert_eq!(requests[2].1, "http://localhost:4000/api/cache/flush");
    }

    #[tokio::test]
    async fn refresh_lists_gets_an_extended_timeout() {
        let transport = Arc::new(RecordingTransport::default());
        let client = ControlClient::builder()
            .timeout(Duration::from_secs(10))
            .transport(transport.clone())
            .build();

        client.enable().await.unwrap();
        client.refresh_lists().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].2, Duration::from_secs(10));
        assert_eq!(requests[1].1, "http://localhost:4000/api/lists/refresh");
        assert_eq!(requests[1].2, Duration::from_secs(30));
    }
}
