use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::screener::{DegradeReason, FetchOutcome, PairScreenerPort, ScreenerError};

/// Mock pair screener that records calls and serves scripted outcomes.
///
/// Unconfigured lookups come back `Degraded`, matching the real client's
/// behavior once retries are exhausted.
#[derive(Debug, Default)]
pub struct MockPairScreener {
    calls: Arc<Mutex<Vec<String>>>,
    outcomes: Arc<Mutex<HashMap<String, FetchOutcome>>>,
}

impl MockPairScreener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to script the outcome for a given lookup key.
    ///
    /// Keys are `venue:<venue>`, `token:<address>`, or `search:<query>`.
    pub fn with_outcome(self, key: &str, outcome: FetchOutcome) -> Self {
        self.outcomes.lock().unwrap().insert(key.to_string(), outcome);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, key: String) -> FetchOutcome {
        self.calls.lock().unwrap().push(key.clone());
        self.outcomes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(FetchOutcome::Degraded {
                reason: DegradeReason::RetriesExhausted {
                    attempts: 0,
                    last_error: "no outcome configured".into(),
                },
            })
    }
}

#[async_trait]
impl PairScreenerPort for MockPairScreener {
    async fn pairs_for_venue(&self, venue: &str) -> Result<FetchOutcome, ScreenerError> {
        Ok(self.respond(format!("venue:{}", venue)))
    }

    async fn pairs_for_token(&self, token_address: &str) -> Result<FetchOutcome, ScreenerError> {
        Ok(self.respond(format!("token:{}", token_address)))
    }

    async fn search_pairs(&self, query: &str) -> Result<FetchOutcome, ScreenerError> {
        Ok(self.respond(format!("search:{}", query)))
    }

    async fn test_connectivity(&self) -> bool {
        self.respond("search:SOL/USDC".to_string()).is_validated()
    }
}
