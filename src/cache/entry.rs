//! Cache Entry Module
//!
//! Defines a stored value together with its expiry deadline.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Deadline after which the entry is stale
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry valid for `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is valid only while the current time is
    /// strictly before `expires_at`; at the deadline itself it is already
    /// stale. Expiry is evaluated lazily at read time, there is no sweeper.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining validity window, zero once expired.
    ///
    /// Useful for debugging and statistics purposes.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
