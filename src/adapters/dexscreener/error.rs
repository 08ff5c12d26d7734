//! Fetch Error Types
//!
//! Per-attempt failure classification for the DexScreener retry loop.

use std::time::Duration;

use thiserror::Error;

use super::validate::ShapeRejection;

/// Failures a single fetch attempt can produce.
///
/// Every variant is retryable by the executor; the taxonomy exists so
/// timeouts, rate limiting, bad statuses, and malformed payloads are never
/// conflated in logs or in the final degradation reason.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Other HTTP client error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server signaled rate limiting (HTTP 429)
    #[error("Rate limited by server")]
    RateLimited {
        /// Server-requested wait, if a parseable `Retry-After` was present
        retry_after: Option<Duration>,
    },

    /// Unexpected HTTP status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not valid JSON
    #[error("Failed to decode body: {0}")]
    Decode(String),

    /// Body decoded but failed shape validation
    #[error("Invalid response shape: {0}")]
    InvalidShape(#[from] ShapeRejection),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Network(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}
