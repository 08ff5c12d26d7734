use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Screener error type
///
/// Programming and environment faults only. Ordinary fetch failures
/// (timeouts, bad statuses, malformed bodies) never surface here; they are
/// folded into [`FetchOutcome::Degraded`] by the executor.
#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),
}

/// A single trading pair as returned by the aggregator.
///
/// Pass-through payload: fields are kept as raw JSON and never interpreted
/// or validated beyond "element of the validated `pairs` array". Accessors
/// exist for the commonly read fields and return `None` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairRecord(Value);

impl PairRecord {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Raw JSON payload of this pair
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// On-chain address of the pair, if present
    pub fn pair_address(&self) -> Option<&str> {
        self.0.get("pairAddress").and_then(Value::as_str)
    }

    /// Hosting exchange identifier, if present
    pub fn dex_id(&self) -> Option<&str> {
        self.0.get("dexId").and_then(Value::as_str)
    }

    /// USD price as reported upstream (string-encoded), if present
    pub fn price_usd(&self) -> Option<&str> {
        self.0.get("priceUsd").and_then(Value::as_str)
    }
}

impl From<Value> for PairRecord {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

/// Why a fetch ended without usable data
#[derive(Error, Debug, Clone)]
pub enum DegradeReason {
    /// Every attempt failed; carries the last-seen failure detail
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Result of one logical fetch.
///
/// `Degraded` stands in for an empty pair list so callers that only need
/// "do I have pairs or not" never branch on error vs. empty.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Response passed shape validation
    Validated { pairs: Vec<PairRecord> },
    /// Retries exhausted; treat as "no data"
    Degraded { reason: DegradeReason },
}

impl FetchOutcome {
    /// Pairs carried by this outcome; empty for `Degraded`
    pub fn pairs(&self) -> &[PairRecord] {
        match self {
            FetchOutcome::Validated { pairs } => pairs,
            FetchOutcome::Degraded { .. } => &[],
        }
    }

    /// Consume the outcome, yielding its pairs (empty for `Degraded`)
    pub fn into_pairs(self) -> Vec<PairRecord> {
        match self {
            FetchOutcome::Validated { pairs } => pairs,
            FetchOutcome::Degraded { .. } => Vec::new(),
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, FetchOutcome::Validated { .. })
    }

    /// Degradation reason, if any
    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            FetchOutcome::Validated { .. } => None,
            FetchOutcome::Degraded { reason } => Some(reason),
        }
    }
}

/// Pair screener port trait
#[async_trait]
pub trait PairScreenerPort: Send + Sync {
    /// Fetch all pairs hosted on a venue (exchange/DEX identifier)
    async fn pairs_for_venue(&self, venue: &str) -> Result<FetchOutcome, ScreenerError>;

    /// Fetch pairs involving a specific token address
    async fn pairs_for_token(&self, token_address: &str) -> Result<FetchOutcome, ScreenerError>;

    /// Free-text pair search
    async fn search_pairs(&self, query: &str) -> Result<FetchOutcome, ScreenerError>;

    /// Lightweight connectivity probe; `true` iff a probe search validates.
    /// Collapses every internal error to `false`, never raises.
    async fn test_connectivity(&self) -> bool;
}
