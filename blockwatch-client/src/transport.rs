//! Transport abstraction for reaching the filter server.
//!
//! The control and metrics clients issue requests through the [`Transport`]
//! trait rather than a concrete HTTP client, so tests (and embedders with
//! their own connection pooling) can inject a fake. [`HttpTransport`] is the
//! production implementation backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ControlError;

/// A completed HTTP exchange: status code plus raw body bytes.
///
/// Transports report transport-level failures (timeout, refused connection)
/// as errors and deliver every completed HTTP response as-is; interpreting
/// non-2xx statuses is the caller's job.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP surface the clients need: GET and POST with a per-request
/// timeout, returning bytes or a transport error.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Issue a GET request.
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, ControlError>;

    /// Issue a POST request with an optional JSON body.
    async fn post(
        &self,
        url: &str,
        json: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<RawResponse, ControlError>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, ControlError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }

    async fn post(
        &self,
        url: &str,
        json: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<RawResponse, ControlError> {
        let mut request = self.client.post(url).timeout(timeout);
        if let Some(body) = json {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
