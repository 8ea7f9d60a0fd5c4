//! Resilience Module
//!
//! Patterns for calling unreliable dependencies: retry with exponential
//! backoff and a three-state circuit breaker. Both are driven by the
//! shared [`OperationError`] type, whose [`FaultKind`] classification
//! decides retryability and circuit accounting.
//!
//! The two patterns compose: wrap a call in the breaker, and the breaker
//! call in the retry executor, to get backoff between probe attempts.

pub mod circuit_breaker;
pub mod error;
pub mod retry;


pub use circuit_breaker::{
    with_circuit_breaker, CircuitBreaker, CircuitBreakerPolicy, CircuitBreakerState, CircuitState,
};
pub use error::{BreakerError, FaultKind, OperationError, RetryError};
pub use retry::{async_with_retry, with_retry, RetryPolicy, RetryState};
