//! DexScreener Adapter
//!
//! Implementation of the PairScreenerPort for the DexScreener aggregator.
//! Handles pair lookups with retries, exponential backoff, server-directed
//! rate-limit waits, concurrency admission control, and response-shape
//! validation. Exhausted retries degrade to an explicit empty outcome
//! instead of an error.

mod client;
mod error;
mod executor;
mod limiter;
mod transport;
mod validate;

pub use client::{DexScreenerClient, ScreenerConfig};
pub use error::FetchError;
pub use executor::{RequestExecutor, RequestSpec, RetryPolicy};
pub use limiter::{RequestLimiter, RequestPermit};
pub use transport::{
    HttpResponse, HttpTransport, ReqwestConnector, ReqwestTransport, TransportConnector,
};
pub use validate::{validate, ShapeRejection};
