//! Cache Configuration Module
//!
//! Tunables for cache capacity, expiry, and statistics collection.

use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be overridden via environment variables, with sensible
/// defaults for hosts that configure nothing.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// TTL applied to entries inserted without an explicit TTL
    pub default_ttl: Duration,
    /// Minimum gap between passive expiry sweeps run inside `get`
    pub check_expired_interval: Duration,
    /// Whether hit/miss/eviction/expiration counters are maintained
    pub enable_stats: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    ///
    /// # Environment Variables
    /// - `DEVHUB_CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `DEVHUB_CACHE_TTL_SECS` - Default TTL in seconds (default: 300)
    /// - `DEVHUB_CACHE_CHECK_INTERVAL_SECS` - Passive sweep gap in seconds (default: 60)
    /// - `DEVHUB_CACHE_STATS` - `true`/`false` stats toggle (default: true)
    pub fn from_env() -> Self {
        Self {
            max_size: env::var("DEVHUB_CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            default_ttl: env::var("DEVHUB_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(300)),
            check_expired_interval: env::var("DEVHUB_CACHE_CHECK_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(60)),
            enable_stats: env::var("DEVHUB_CACHE_STATS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Duration::from_secs(300),
            check_expired_interval: Duration::from_secs(60),
            enable_stats: true,
        }
    }
}
