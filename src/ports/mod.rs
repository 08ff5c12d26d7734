//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Pair screening (venue/token lookups, search, connectivity probing)

pub mod mocks;
pub mod screener;

// Re-export main traits and types
pub use screener::{
    DegradeReason, FetchOutcome, PairRecord, PairScreenerPort, ScreenerError,
};
