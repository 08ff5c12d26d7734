//! DexScreener API Client
//!
//! Facade over the retrying executor. Owns the lazily-created HTTP
//! session and exposes the aggregator's pair-lookup operations. Ordinary
//! fetch failures never surface as errors here: every operation returns a
//! [`FetchOutcome`], and the `Err` arm is reserved for programming and
//! environment faults such as a session that cannot be constructed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::executor::{RequestExecutor, RequestSpec, RetryPolicy};
use super::limiter::RequestLimiter;
use super::transport::{HttpTransport, ReqwestConnector, TransportConnector};
use crate::ports::screener::{FetchOutcome, PairScreenerPort, ScreenerError};

/// Public DexScreener REST API
const DEXSCREENER_API: &str = "https://api.dexscreener.com/latest";

/// Fixed search used by the connectivity probe
const CONNECTIVITY_PROBE: &str = "SOL/USDC";

/// DexScreener client configuration
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Base URL for the aggregator API
    pub base_url: String,
    /// Concurrently in-flight request cap
    pub max_concurrent_requests: usize,
    /// Retry behavior per logical fetch
    pub retry: RetryPolicy,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: DEXSCREENER_API.to_string(),
            max_concurrent_requests: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl ScreenerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ScreenerError> {
        if self.base_url.trim().is_empty() {
            return Err(ScreenerError::Config("base_url cannot be empty".into()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ScreenerError::Config(
                "max_concurrent_requests must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScreenerError::Config("max_attempts must be > 0".into()));
        }
        if self.retry.multiplier == 0 {
            return Err(ScreenerError::Config("multiplier must be >= 1".into()));
        }
        if self.retry.timeout.is_zero() {
            return Err(ScreenerError::Config("timeout must be > 0".into()));
        }
        Ok(())
    }
}

/// DexScreener aggregator client.
///
/// The session moves `Uninitialized -> Active` on [`initialize`] or on the
/// first request, and `Active -> Closed` on [`close`]; a request issued
/// while closed recreates the session, so closed and uninitialized are
/// equivalent entry points. At most one live session exists per client.
///
/// [`initialize`]: DexScreenerClient::initialize
/// [`close`]: DexScreenerClient::close
pub struct DexScreenerClient {
    executor: RequestExecutor,
    connector: Arc<dyn TransportConnector>,
    session: Mutex<Option<Arc<dyn HttpTransport>>>,
}

impl DexScreenerClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ScreenerError> {
        Self::with_config(ScreenerConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ScreenerConfig) -> Result<Self, ScreenerError> {
        Self::with_connector(config, Arc::new(ReqwestConnector))
    }

    /// Create a client backed by a custom transport connector
    pub fn with_connector(
        config: ScreenerConfig,
        connector: Arc<dyn TransportConnector>,
    ) -> Result<Self, ScreenerError> {
        config.validate()?;

        let limiter = RequestLimiter::new(config.max_concurrent_requests);
        let executor = RequestExecutor::new(config.base_url, config.retry, limiter);

        Ok(Self {
            executor,
            connector,
            session: Mutex::new(None),
        })
    }

    /// Create the session if absent. Idempotent.
    pub async fn initialize(&self) -> Result<(), ScreenerError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(self.connector.connect()?);
            tracing::debug!("screener session created");
        }
        Ok(())
    }

    /// Drop the session. Idempotent; safe without a prior initialize.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if session.take().is_some() {
            tracing::debug!("screener session closed");
        }
    }

    /// Whether a session is currently live
    pub async fn is_active(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Fetch all pairs hosted on a venue
    pub async fn pairs_for_venue(&self, venue: &str) -> Result<FetchOutcome, ScreenerError> {
        self.fetch(RequestSpec::new(format!("dex/pairs/{}", venue)))
            .await
    }

    /// Fetch pairs involving a specific token address
    pub async fn pairs_for_token(
        &self,
        token_address: &str,
    ) -> Result<FetchOutcome, ScreenerError> {
        self.fetch(RequestSpec::new(format!("dex/tokens/{}", token_address)))
            .await
    }

    /// Free-text pair search
    pub async fn search_pairs(&self, query: &str) -> Result<FetchOutcome, ScreenerError> {
        self.fetch(RequestSpec::new("dex/search").with_query("q", query))
            .await
    }

    /// Probe the aggregator with a fixed search.
    ///
    /// `true` iff the probe came back validated; every internal error
    /// collapses to `false`.
    pub async fn test_connectivity(&self) -> bool {
        match self.search_pairs(CONNECTIVITY_PROBE).await {
            Ok(outcome) => outcome.is_validated(),
            Err(e) => {
                tracing::error!(error = %e, "connectivity test failed");
                false
            }
        }
    }

    async fn fetch(&self, spec: RequestSpec) -> Result<FetchOutcome, ScreenerError> {
        let session = self.session_handle().await?;
        Ok(self.executor.execute(session.as_ref(), &spec).await)
    }

    /// Current session, created on demand
    async fn session_handle(&self) -> Result<Arc<dyn HttpTransport>, ScreenerError> {
        let mut session = self.session.lock().await;
        match session.as_ref() {
            Some(transport) => Ok(transport.clone()),
            None => {
                let transport = self.connector.connect()?;
                *session = Some(transport.clone());
                tracing::debug!("screener session created");
                Ok(transport)
            }
        }
    }
}

#[async_trait]
impl PairScreenerPort for DexScreenerClient {
    async fn pairs_for_venue(&self, venue: &str) -> Result<FetchOutcome, ScreenerError> {
        DexScreenerClient::pairs_for_venue(self, venue).await
    }

    async fn pairs_for_token(&self, token_address: &str) -> Result<FetchOutcome, ScreenerError> {
        DexScreenerClient::pairs_for_token(self, token_address).await
    }

    async fn search_pairs(&self, query: &str) -> Result<FetchOutcome, ScreenerError> {
        DexScreenerClient::search_pairs(self, query).await
    }

    async fn test_connectivity(&self) -> bool {
        DexScreenerClient::test_connectivity(self).await
    }
}
