//! Request Admission Control
//!
//! Bounds the number of concurrently in-flight aggregator requests. A
//! holder keeps its permit for the whole attempt loop, backoff sleeps
//! included, so a struggling upstream throttles further concurrent calls.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrency limiter over aggregator requests.
///
/// Cheap to clone; clones share the same capacity pool.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// Exclusive use of one capacity unit.
///
/// The unit returns to the pool when the permit drops, on every exit path
/// of the holder's scope: normal return, error, or task cancellation.
#[derive(Debug)]
pub struct RequestPermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestLimiter {
    /// Create a limiter admitting up to `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Suspend until a slot is free, then take it.
    pub async fn acquire(&self) -> RequestPermit {
        // The semaphore is owned by the limiter and never closed.
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore never closed");
        RequestPermit { _permit: permit }
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<RequestPermit> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| RequestPermit { _permit: permit })
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
