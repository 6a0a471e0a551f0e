//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored value with its absolute expiration deadline.
///
/// The deadline is wall-clock time so that it stays meaningful after the
/// entry has been written to a snapshot and restored by another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expire_at: Option<i64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// A zero TTL means the entry never expires. Sub-millisecond TTLs are
    /// rounded up to one millisecond.
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        let expire_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| {
                let millis = i64::try_from(ttl.as_millis().max(1)).unwrap_or(i64::MAX);
                current_timestamp_ms().saturating_add(millis)
            });

        Self { value, expire_at }
    }

    /// Creates an entry with an already computed deadline.
    pub fn with_expire_at(value: String, expire_at: Option<i64>) -> Self {
        Self { value, expire_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expire_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// Never negative: an elapsed deadline yields `Duration::ZERO`.
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.expire_at.map(|expires| {
            let remaining = expires.saturating_sub(current_timestamp_ms()).max(0);
            Duration::from_millis(remaining as u64)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
