//! HTTP Transport Seam
//!
//! The executor talks to the aggregator through [`HttpTransport`], and the
//! facade creates sessions through [`TransportConnector`]. Production uses
//! reqwest behind both; tests script the traits directly so retry and
//! timing behavior is checked without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;

use super::error::FetchError;
use crate::ports::screener::ScreenerError;

/// Minimal view of an HTTP response the retry loop needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed `Retry-After` header, when present and well-formed
    pub retry_after: Option<Duration>,
    /// Raw body text
    pub body: String,
}

/// One live session against the aggregator.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET and read the full response within `timeout`.
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;
}

/// Creates sessions on demand for the client's lazy lifecycle.
pub trait TransportConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn HttpTransport>, ScreenerError>;
}

/// reqwest-backed transport; one instance owns one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ScreenerError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ScreenerError::Session(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let mut request = self.http.get(url).timeout(timeout);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Connector producing [`ReqwestTransport`] sessions.
#[derive(Debug, Default)]
pub struct ReqwestConnector;

impl TransportConnector for ReqwestConnector {
    fn connect(&self) -> Result<Arc<dyn HttpTransport>, ScreenerError> {
        Ok(Arc::new(ReqwestTransport::new()?))
    }
}

/// Parse a `Retry-After` header as whole seconds.
///
/// HTTP-date forms and garbage values read as absent; the caller falls back
/// to its configured default wait.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
