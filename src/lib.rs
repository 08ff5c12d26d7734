#![allow(dead_code, unused_imports, unused_variables)]
//! DexScreener Market-Data Client Library
//!
//! A resilient client for the DexScreener aggregator: bounded request
//! concurrency, exponential-backoff retries, server-directed rate-limit
//! waits, and response-shape validation. Exhausted retries degrade to an
//! explicit empty outcome rather than an error.
//!
//! # Modules
//!
//! - `ports`: Trait abstractions (PairScreenerPort) and outcome types
//! - `adapters`: External implementations (DexScreener HTTP client)
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod config;
pub mod ports;
