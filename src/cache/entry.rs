//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value with its expiry and access metadata.
///
/// Entries are immutable: a successful read does not mutate the entry in
/// place but produces a replacement via [`CacheEntry::with_access`], which
/// the store swaps in under its lock.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation time
    pub created_at: Instant,
    /// Absolute expiry time; always `>= created_at`
    pub expires_at: Instant,
    /// Number of reads, counting the insert as the first access
    pub access_count: u64,
    /// Time of the most recent read (or the insert)
    pub last_accessed: Instant,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - How long the entry stays valid
    pub fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 1,
            last_accessed: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is still live at exactly `expires_at`
    /// and expires once the current time is strictly past it.
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    // == Record Access ==
    /// Returns a copy of this entry with the read recorded.
    ///
    /// Increments `access_count` and stamps `last_accessed`; value and
    /// expiry are unchanged (reads do not refresh the TTL).
    pub fn with_access(self) -> Self {
        Self {
            access_count: self.access_count + 1,
            last_accessed: Instant::now(),
            ..self
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, saturating at zero once expired.
    ///
    /// Useful for diagnostics and host-level reporting.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
