//! Cache Store Module
//!
//! Main cache engine combining an LRU-ordered map with TTL expiration and
//! hit/miss/eviction/expiration statistics.

use std::fmt;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::config::CacheConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::error::{CacheError, CacheResult};
use crate::cache::stats::CacheStats;

// == Inner State ==
/// Everything the cache mutates, guarded together by one mutex: the ordered
/// store, the stats snapshot, and the passive-sweep clock.
struct CacheInner<T> {
    /// Key-value storage, most recently used at the front
    entries: LruCache<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
    /// When the last expiry sweep ran
    last_sweep: Instant,
}

impl<T> CacheInner<T> {
    /// Removes every expired entry, returning how many were dropped.
    fn sweep_expired(&mut self, enable_stats: bool) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in &expired_keys {
            self.entries.pop(key);
            if enable_stats {
                self.stats = self.stats.with_expiration();
            }
        }

        count
    }
}

// == Cache ==
/// Thread-safe, bounded, TTL-aware key/value store with LRU eviction.
///
/// All methods take `&self`; shared use across threads needs nothing beyond
/// an `Arc<Cache<T>>`. A single internal mutex guards the store, the stats,
/// and the sweep clock; no user-supplied callback ever runs under it.
///
/// Values are handed out by clone, so `T` is typically cheap to clone or an
/// `Arc` itself.
pub struct Cache<T> {
    inner: Mutex<CacheInner<T>>,
    config: CacheConfig,
}

impl<T: Clone> Cache<T> {
    // == Constructor ==
    /// Creates a new cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                stats: CacheStats::new(),
                last_sweep: Instant::now(),
            }),
            config,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Runs a passive expiry sweep first when `check_expired_interval` has
    /// elapsed since the last one. An entry found expired is removed on the
    /// spot, counting both an expiration and a miss. A successful read
    /// replaces the entry with an access-incremented copy at the MRU
    /// position.
    ///
    /// # Arguments
    /// * `key` - The key to retrieve
    pub fn get(&self, key: &str) -> CacheResult<T> {
        let mut inner = self.inner.lock();
        self.maybe_sweep(&mut inner);

        match inner.entries.pop(key) {
            None => {
                if self.config.enable_stats {
                    inner.stats = inner.stats.with_miss();
                }
                Err(CacheError::Miss(key.to_string()))
            }
            Some(entry) if entry.is_expired() => {
                if self.config.enable_stats {
                    inner.stats = inner.stats.with_expiration().with_miss();
                }
                Err(CacheError::Expired(key.to_string()))
            }
            Some(entry) => {
                let entry = entry.with_access();
                let value = entry.value.clone();
                inner.entries.put(key.to_string(), entry);
                if self.config.enable_stats {
                    inner.stats = inner.stats.with_hit();
                }
                Ok(value)
            }
        }
    }

    // == Put ==
    /// Stores a key-value pair, overwriting any previous entry.
    ///
    /// If the cache is at capacity and the key is new, the least recently
    /// used entry is evicted first. The new entry lands at the MRU position
    /// with `expires_at = now + ttl` (falling back to the configured
    /// default TTL).
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses `default_ttl` if None)
    pub fn put(&self, key: impl Into<String>, value: T, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let mut inner = self.inner.lock();

        // Evict only when inserting a new key at capacity; overwrites reuse
        // the existing slot
        if inner.entries.len() >= self.config.max_size && !inner.entries.contains(&key) {
            if let Some((evicted_key, _)) = inner.entries.pop_lru() {
                debug!(key = %evicted_key, "evicted least recently used entry");
                if self.config.enable_stats {
                    inner.stats = inner.stats.with_eviction();
                }
            }
        }

        inner.entries.put(key, CacheEntry::new(value, ttl));
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, computing and caching it on a
    /// miss.
    ///
    /// The compute function runs **without** the cache lock held, so slow
    /// computations never stall other callers. Concurrent callers missing
    /// on the same key may therefore all compute; the last completed write
    /// wins. There is no single-flight deduplication.
    ///
    /// A compute failure is returned as [`CacheError::Compute`] carrying
    /// the error text; nothing is cached in that case.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `ttl` - Optional TTL for a newly computed value
    /// * `compute` - Zero-argument fallible producer of the value
    pub fn get_or_compute<F, E>(&self, key: &str, ttl: Option<Duration>, compute: F) -> CacheResult<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        if let Ok(value) = self.get(key) {
            return Ok(value);
        }

        match compute() {
            Ok(value) => {
                self.put(key, value.clone(), ttl);
                Ok(value)
            }
            Err(e) => Err(CacheError::Compute(e.to_string())),
        }
    }

    // == Invalidate ==
    /// Removes an entry by key. Idempotent: removing an absent key is fine.
    ///
    /// # Arguments
    /// * `key` - The key to remove
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.entries.pop(key);
    }

    // == Clear ==
    /// Empties the store and resets statistics to zero.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::new();
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    ///
    /// The snapshot may be immediately stale relative to concurrent
    /// activity; stats are advisory.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries right now, regardless of the passive
    /// sweep interval, and restarts the sweep clock.
    ///
    /// Returns the number of entries removed. The background sweeper task
    /// drives this; hosts can also call it directly.
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.last_sweep = Instant::now();
        inner.sweep_expired(self.config.enable_stats)
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    // == Config ==
    /// Returns the configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Runs the passive expiry sweep if the configured interval has
    /// elapsed. Caller holds the lock.
    fn maybe_sweep(&self, inner: &mut CacheInner<T>) {
        if inner.last_sweep.elapsed() < self.config.check_expired_interval {
            return;
        }

        inner.last_sweep = Instant::now();
        let removed = inner.sweep_expired(self.config.enable_stats);
        if removed > 0 {
            debug!(removed, "passive sweep removed expired entries");
        }
    }
}

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
