//! Retrying Request Executor
//!
//! Performs one logical fetch against the aggregator: takes a limiter
//! slot, runs the attempt loop (timeout, status classification, backoff or
//! server-directed rate-limit wait, shape validation), and reports the
//! result by value. Exhausted retries come back as a `Degraded` outcome,
//! never as an error or a panic, so callers that only need "do I have
//! pairs or not" stay free of catch-all handling.

use std::time::Duration;

use serde_json::Value;

use super::error::FetchError;
use super::limiter::RequestLimiter;
use super::transport::HttpTransport;
use super::validate::validate;
use crate::ports::screener::{DegradeReason, FetchOutcome, PairRecord};

/// Endpoint path plus optional query parameters; immutable per call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    path: String,
    query: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Builder method to append a query parameter
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Full request URL under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Retry behavior for one logical fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, first try included
    pub max_attempts: u32,
    /// Backoff before the second attempt
    pub base_delay: Duration,
    /// Backoff growth factor per attempt
    pub multiplier: u32,
    /// Per-request timeout covering send and body read
    pub timeout: Duration,
    /// Wait applied on HTTP 429 when the server omits `Retry-After`
    pub rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            timeout: Duration::from_secs(30),
            rate_limit_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt following `attempt` (1-indexed):
    /// `base_delay * multiplier^(attempt-1)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Executes fetches against a fixed base URL under a shared limiter.
///
/// Base URL and limiter are required constructor inputs; there is no
/// ambient default for either.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    base_url: String,
    policy: RetryPolicy,
    limiter: RequestLimiter,
}

impl RequestExecutor {
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy, limiter: RequestLimiter) -> Self {
        Self {
            base_url: base_url.into(),
            policy,
            limiter,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    /// Run the attempt loop for `spec`, returning the outcome by value.
    ///
    /// The limiter slot is held from before the first attempt until the
    /// call returns, sleeps included; a slow upstream therefore consumes
    /// capacity longer and throttles further concurrent calls.
    pub async fn execute(&self, transport: &dyn HttpTransport, spec: &RequestSpec) -> FetchOutcome {
        let _permit = self.limiter.acquire().await;

        let url = spec.url(&self.base_url);
        let mut last_failure: Option<FetchError> = None;

        for attempt in 1..=self.policy.max_attempts {
            tracing::debug!(url = %url, attempt, "issuing request");

            match self.attempt(transport, &url, spec).await {
                Ok(pairs) => {
                    tracing::debug!(url = %url, attempt, pairs = pairs.len(), "validated response");
                    return FetchOutcome::Validated { pairs };
                }
                Err(failure) => {
                    match &failure {
                        FetchError::RateLimited { retry_after } => {
                            let wait = retry_after.unwrap_or(self.policy.rate_limit_wait);
                            tracing::warn!(
                                url = %url,
                                attempt,
                                wait_secs = wait.as_secs(),
                                "rate limited, honoring server wait"
                            );
                            tokio::time::sleep(wait).await;
                        }
                        FetchError::Status { status, body } => {
                            tracing::error!(url = %url, attempt, status, body = %body, "API error");
                            self.backoff_if_remaining(attempt).await;
                        }
                        FetchError::InvalidShape(rejection) => {
                            tracing::warn!(url = %url, attempt, %rejection, "response failed shape validation");
                            self.backoff_if_remaining(attempt).await;
                        }
                        other => {
                            tracing::warn!(url = %url, attempt, error = %other, "transient request failure");
                            self.backoff_if_remaining(attempt).await;
                        }
                    }
                    last_failure = Some(failure);
                }
            }
        }

        let last_error = last_failure
            .map(|failure| failure.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        tracing::error!(
            url = %url,
            attempts = self.policy.max_attempts,
            last_error = %last_error,
            "all retry attempts failed"
        );

        FetchOutcome::Degraded {
            reason: DegradeReason::RetriesExhausted {
                attempts: self.policy.max_attempts,
                last_error,
            },
        }
    }

    async fn attempt(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        spec: &RequestSpec,
    ) -> Result<Vec<PairRecord>, FetchError> {
        let response = transport.get(url, spec.query(), self.policy.timeout).await?;

        match response.status {
            200 => {
                let raw: Value = serde_json::from_str(&response.body)
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                Ok(validate(&raw)?)
            }
            429 => Err(FetchError::RateLimited {
                retry_after: response.retry_after,
            }),
            status => Err(FetchError::Status {
                status,
                body: response.body,
            }),
        }
    }

    async fn backoff_if_remaining(&self, attempt: u32) {
        if attempt < self.policy.max_attempts {
            tokio::time::sleep(self.policy.backoff_delay(attempt)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dexscreener::transport::HttpResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Transport that replays a scripted sequence of responses.
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Result<HttpResponse, FetchError>>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(
            &self,
            _url: &str,
            _query: &[(String, String)],
            _timeout: Duration,
        ) -> Result<HttpResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.steps
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted transport ran out of steps")
        }
    }

    fn ok(body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 200,
            retry_after: None,
            body: body.to_string(),
        })
    }

    fn status(code: u16, body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: code,
            retry_after: None,
            body: body.to_string(),
        })
    }

    fn rate_limited(retry_after: Option<u64>) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 429,
            retry_after: retry_after.map(Duration::from_secs),
            body: String::new(),
        })
    }

    fn executor() -> RequestExecutor {
        RequestExecutor::new(
            "https://api.dexscreener.com/latest",
            RetryPolicy::default(),
            RequestLimiter::new(2),
        )
    }

    const VALID_BODY: &str = r#"{"pairs":[{"dexId":"raydium","priceUsd":"142.37"}]}"#;

    #[test]
    fn test_backoff_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_delay_custom_base_and_multiplier() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(500),
            multiplier: 3,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1_500));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(4_500));
    }

    #[test]
    fn test_request_spec_url_building() {
        let spec = RequestSpec::new("dex/pairs/solana");
        assert_eq!(
            spec.url("https://api.dexscreener.com/latest"),
            "https://api.dexscreener.com/latest/dex/pairs/solana"
        );
        // Trailing and leading slashes collapse to a single separator
        assert_eq!(
            RequestSpec::new("/dex/search").url("https://api.dexscreener.com/latest/"),
            "https://api.dexscreener.com/latest/dex/search"
        );
    }

    #[test]
    fn test_request_spec_query_builder() {
        let spec = RequestSpec::new("dex/search").with_query("q", "SOL/USDC");
        assert_eq!(spec.query(), &[("q".to_string(), "SOL/USDC".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_returns_immediately() {
        let transport = ScriptedTransport::new(vec![ok(VALID_BODY)]);
        let start = Instant::now();

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/pairs/solana"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(outcome.pairs().len(), 1);
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_backed_off_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::Network("connection reset".into())),
            ok(VALID_BODY),
        ]);
        let start = Instant::now();

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/pairs/solana"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(transport.calls(), 3);
        // 1s after attempt 1, 2s after attempt 2
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shape_rejection_retried_like_transient_failure() {
        let transport = ScriptedTransport::new(vec![ok("{}"), ok(VALID_BODY)]);
        let start = Instant::now();

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/search"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(transport.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_uses_server_wait_not_backoff() {
        let transport = ScriptedTransport::new(vec![rate_limited(Some(7)), ok(VALID_BODY)]);
        let start = Instant::now();

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/tokens/abc"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(transport.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_falls_back_to_default_wait() {
        let transport = ScriptedTransport::new(vec![rate_limited(None), ok(VALID_BODY)]);
        let policy = RetryPolicy {
            rate_limit_wait: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        let executor = RequestExecutor::new(
            "https://api.dexscreener.com/latest",
            policy,
            RequestLimiter::new(1),
        );
        let start = Instant::now();

        let outcome = executor
            .execute(&transport, &RequestSpec::new("dex/tokens/abc"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_degrade_without_panicking() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
        ]);
        let start = Instant::now();

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/pairs/solana"))
            .await;

        assert!(!outcome.is_validated());
        assert!(outcome.pairs().is_empty());
        assert_eq!(transport.calls(), 3);
        // Backoff between attempts only, none after the final one
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        let reason = outcome.degrade_reason().unwrap().to_string();
        assert!(reason.contains("3 attempts"));
        assert!(reason.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_bad_status_degrades_with_detail() {
        let transport = ScriptedTransport::new(vec![
            status(500, "internal error"),
            status(500, "internal error"),
            status(500, "internal error"),
        ]);

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/search"))
            .await;

        let reason = outcome.degrade_reason().unwrap().to_string();
        assert!(reason.contains("500"));
        assert!(reason.contains("internal error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_body_is_retryable() {
        let transport =
            ScriptedTransport::new(vec![ok("<html>gateway error</html>"), ok(VALID_BODY)]);

        let outcome = executor()
            .execute(&transport, &RequestSpec::new("dex/search"))
            .await;

        assert!(outcome.is_validated());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_held_across_backoff_sleeps() {
        let limiter = RequestLimiter::new(1);
        let executor = RequestExecutor::new(
            "https://api.dexscreener.com/latest",
            RetryPolicy::default(),
            limiter.clone(),
        );
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(FetchError::Timeout),
            ok(VALID_BODY),
        ]));

        let task_transport = transport.clone();
        let task = tokio::spawn(async move {
            executor
                .execute(task_transport.as_ref(), &RequestSpec::new("dex/search"))
                .await
        });

        // Let the call take the slot and enter its first backoff sleep
        for _ in 0..10 {
            if limiter.available() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(limiter.available(), 0);

        let outcome = task.await.unwrap();
        assert!(outcome.is_validated());
        assert_eq!(limiter.available(), 1);
    }
}
