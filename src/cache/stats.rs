//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions, and
//! expirations.

use serde::Serialize;

// == Cache Stats ==
/// Cache performance counters.
///
/// Immutable replace-on-write: each `with_*` method consumes the snapshot
/// and returns an updated one, which the store swaps in under its lock.
/// `total_requests` counts lookups only (`hits + misses`); evictions and
/// expirations are tracked separately and do not contribute to it.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted by the LRU policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of lookups served (hits + misses)
    pub total_requests: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate as a percentage.
    ///
    /// Returns `hits / total_requests * 100.0`, or 0.0 if no lookups have
    /// been made.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64 * 100.0
        }
    }

    // == Record Hit ==
    /// Returns a snapshot with one more hit recorded.
    pub fn with_hit(self) -> Self {
        Self {
            hits: self.hits + 1,
            total_requests: self.total_requests + 1,
            ..self
        }
    }

    // == Record Miss ==
    /// Returns a snapshot with one more miss recorded.
    pub fn with_miss(self) -> Self {
        Self {
            misses: self.misses + 1,
            total_requests: self.total_requests + 1,
            ..self
        }
    }

    // == Record Eviction ==
    /// Returns a snapshot with one more LRU eviction recorded.
    pub fn with_eviction(self) -> Self {
        Self {
            evictions: self.evictions + 1,
            ..self
        }
    }

    // == Record Expiration ==
    /// Returns a snapshot with one more TTL expiration recorded.
    pub fn with_expiration(self) -> Self {
        Self {
            expirations: self.expirations + 1,
            ..self
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.total_requests, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let stats = CacheStats::new().with_hit().with_hit().with_hit();
        assert_eq!(stats.hit_rate(), 100.0);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let stats = CacheStats::new().with_miss().with_miss();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats::new().with_hit().with_miss();
        assert_eq!(stats.hit_rate(), 50.0);

        let stats = stats.with_hit().with_hit();
        assert_eq!(stats.hit_rate(), 75.0);
    }

    #[test]
    fn test_lookups_drive_total_requests() {
        let stats = CacheStats::new().with_hit().with_miss().with_miss();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.hits + stats.misses, stats.total_requests);
    }

    #[test]
    fn test_evictions_do_not_count_as_requests() {
        let stats = CacheStats::new().with_eviction().with_eviction();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.total_requests, 0);
    }

    #[test]
    fn test_expirations_do_not_count_as_requests() {
        let stats = CacheStats::new().with_expiration();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_requests, 0);
    }
}
