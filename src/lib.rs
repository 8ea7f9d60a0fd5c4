//! DevHub Core - Caching and resilience building blocks
//!
//! Provides an in-memory cache with TTL expiration and LRU eviction,
//! plus retry and circuit-breaker primitives for calling unreliable
//! dependencies.

pub mod cache;
pub mod resilience;
pub mod tasks;

pub use cache::{Cache, CacheConfig, CacheError, CacheKey, CacheStats};
pub use resilience::{
    async_with_retry, with_circuit_breaker, with_retry, CircuitBreaker, CircuitBreakerPolicy,
    CircuitState, FaultKind, OperationError, RetryPolicy,
};
pub use tasks::spawn_cleanup_task;
