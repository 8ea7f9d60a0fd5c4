//! Error types for the cache
//!
//! Expected lookup failures are values, not panics: misses and expiries are
//! part of the cache's normal vocabulary.

use thiserror::Error;

// == Cache Error Enum ==
/// Failure cases reported by cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not present in the store
    #[error("Cache miss for key: {0}")]
    Miss(String),

    /// Key was present but its TTL had elapsed
    #[error("Cache entry expired for key: {0}")]
    Expired(String),

    /// The caller-supplied compute function failed
    #[error("Failed to compute value: {0}")]
    Compute(String),

    /// A key argument could not be serialized for digesting
    #[error("Failed to build cache key: {0}")]
    Key(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
