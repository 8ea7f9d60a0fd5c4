//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction, and
//! deterministic key derivation. Independent of the resilience module;
//! callers wanting retries around a compute function compose the two
//! themselves.

mod config;
mod entry;
mod error;
mod key;
mod stats;
mod store;


// Re-export public types
pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::Cache;
