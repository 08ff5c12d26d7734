//! Response Shape Validation
//!
//! Checks a decoded payload against the aggregator's success schema before
//! any of it is trusted: a JSON object with a `pairs` array (possibly
//! empty). Anything else is rejected with a reason; the executor treats a
//! rejection as a retryable failure, never a fatal one.

use serde_json::Value;
use thiserror::Error;

use crate::ports::screener::PairRecord;

/// Why a payload failed shape validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRejection {
    #[error("not an object")]
    NotAnObject,

    #[error("missing pairs field")]
    MissingPairsField,

    #[error("pairs is not an array")]
    PairsNotAnArray,
}

/// Validate a decoded payload, extracting its pair records.
pub fn validate(raw: &Value) -> Result<Vec<PairRecord>, ShapeRejection> {
    let object = raw.as_object().ok_or(ShapeRejection::NotAnObject)?;
    let pairs = object
        .get("pairs")
        .ok_or(ShapeRejection::MissingPairsField)?;
    let array = pairs.as_array().ok_or(ShapeRejection::PairsNotAnArray)?;

    Ok(array.iter().cloned().map(PairRecord::new).collect())
}
