//! Retry Execution Module
//!
//! Runs fallible operations under a configurable policy with exponential
//! backoff and optional jitter. Blocking and async executors share the
//! same policy and the same terminal-outcome rules: plain failures are
//! retried until attempts run out, classified faults retry only when
//! their kind is listed as retryable.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::resilience::error::{FaultKind, OperationError, RetryError};

// == Retry Policy ==
/// Controls attempt count, backoff shape, and which fault kinds retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first call
    pub max_attempts: usize,
    /// Backoff before the second attempt
    pub base_delay: Duration,
    /// Upper bound applied to the computed backoff before jitter
    pub max_delay: Duration,
    /// Multiplier applied for each further attempt
    pub exponential_base: f64,
    /// Adds up to 25% random slack to each backoff when set
    pub jitter: bool,
    /// Fault kinds considered transient
    pub retryable_kinds: Vec<FaultKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
            retryable_kinds: vec![FaultKind::Connection, FaultKind::Timeout, FaultKind::Io],
        }
    }
}

impl RetryPolicy {
    /// Preset for short network calls: more attempts, tighter delays.
    pub fn for_network() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            ..RetryPolicy::default()
        }
    }

    /// Returns true when a fault of `kind` is worth retrying.
    pub fn should_retry(&self, kind: FaultKind) -> bool {
        self.retryable_kinds.contains(&kind)
    }

    /// Computes the backoff delay preceding the given attempt.
    ///
    /// Attempt 0 is the initial call and has no delay. From attempt 1 on
    /// the delay grows as `base_delay * exponential_base^(attempt - 1)`,
    /// capped at `max_delay`. Jitter then adds up to 25% of the capped
    /// value, so the result can exceed `max_delay` by that margin.
    ///
    /// # Arguments
    /// * `attempt` - Zero-based attempt number about to run
    ///
    /// # Returns
    /// * `Duration` - Time to wait before that attempt
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = (attempt - 1) as i32;
        let raw = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        let capped = raw.min(self.max_delay.as_secs_f64()).max(0.0);

        let with_jitter = if self.jitter {
            capped + capped * 0.25 * fastrand::f64()
        } else {
            capped
        };

        Duration::from_secs_f64(with_jitter)
    }
}

// == Retry State ==
/// Progress of a retry loop, tracked across attempts.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Loop steps completed so far
    pub attempt: usize,
    /// Total time spent sleeping between attempts
    pub total_delay: Duration,
    /// Most recent classified fault, if any
    pub last_error: Option<OperationError>,
}

impl RetryState {
    pub fn new() -> Self {
        RetryState::default()
    }

    /// Returns the state advanced by one step.
    ///
    /// # Arguments
    /// * `delay` - Backoff slept before this step, if any
    /// * `error` - Fault observed during this step, if any
    pub fn next_attempt(self, delay: Duration, error: Option<OperationError>) -> Self {
        RetryState {
            attempt: self.attempt + 1,
            total_delay: self.total_delay + delay,
            last_error: error.or(self.last_error),
        }
    }
}

// == Verdict ==
/// Decides whether a failed attempt terminates the loop.
///
/// Plain failures keep retrying until the attempt budget is spent, then
/// surface as `Exhausted`. Faults first check retryability of their kind,
/// then the attempt budget.
fn retry_verdict(
    error: &OperationError,
    attempt: usize,
    policy: &RetryPolicy,
) -> Option<RetryError> {
    match error {
        OperationError::Failed(_) => {
            if attempt + 1 >= policy.max_attempts {
                Some(RetryError::Exhausted {
                    attempts: policy.max_attempts,
                    last: Some(error.clone()),
                })
            } else {
                None
            }
        }
        OperationError::Fault { kind, .. } => {
            if !policy.should_retry(*kind) {
                Some(RetryError::NonRetryable {
                    error: error.clone(),
                })
            } else if attempt + 1 >= policy.max_attempts {
                Some(RetryError::MaxAttemptsExceeded {
                    attempts: policy.max_attempts,
                    error: error.clone(),
                })
            } else {
                None
            }
        }
    }
}

// == Blocking Executor ==
/// Runs `operation` under `policy`, sleeping between attempts.
///
/// The operation is called up to `max_attempts` times. A success returns
/// immediately. A non-retryable fault terminates at once; otherwise the
/// loop backs off per [`RetryPolicy::calculate_delay`] and tries again.
///
/// # Arguments
/// * `policy` - Retry policy to apply
/// * `operation` - Fallible operation, re-invoked on each attempt
///
/// # Returns
/// * `Ok(T)` - Value from the first successful attempt
/// * `Err(RetryError)` - Terminal outcome when no attempt succeeded
///
/// # Example
/// ```
/// use devhub_core::resilience::{with_retry, OperationError, RetryPolicy};
///
/// let result = with_retry(&RetryPolicy::default(), || {
///     Ok::<_, OperationError>("data")
/// });
/// assert_eq!(result, Ok("data"));
/// ```
pub fn with_retry<T, F>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Result<T, OperationError>,
{
    let mut state = RetryState::new();

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.calculate_delay(attempt);
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Backing off before retry"
            );
            std::thread::sleep(delay);
            state = state.next_attempt(delay, None);
        }

        match operation() {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                warn!(attempt, error = %error, "Operation attempt failed");
                if error.kind().is_some() {
                    state = state.next_attempt(Duration::ZERO, Some(error.clone()));
                }
                if let Some(terminal) = retry_verdict(&error, attempt, policy) {
                    return Err(terminal);
                }
            }
        }
    }

    // Only reachable with a zero-attempt policy
    Err(RetryError::Exhausted {
        attempts: state.attempt,
        last: state.last_error,
    })
}

// == Async Executor ==
/// Async counterpart of [`with_retry`], backing off with the tokio timer.
///
/// # Arguments
/// * `policy` - Retry policy to apply
/// * `operation` - Closure producing a fresh future per attempt
///
/// # Example
/// ```
/// use devhub_core::resilience::{async_with_retry, OperationError, RetryPolicy};
///
/// let result = tokio_test::block_on(async {
///     async_with_retry(&RetryPolicy::default(), || async {
///         Ok::<_, OperationError>("data")
///     })
///     .await
/// });
/// assert_eq!(result, Ok("data"));
/// ```
pub async fn async_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OperationError>>,
{
    let mut state = RetryState::new();

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.calculate_delay(attempt);
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Backing off before retry"
            );
            tokio::time::sleep(delay).await;
            state = state.next_attempt(delay, None);
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                warn!(attempt, error = %error, "Operation attempt failed");
                if error.kind().is_some() {
                    state = state.next_attempt(Duration::ZERO, Some(error.clone()));
                }
                if let Some(terminal) = retry_verdict(&error, attempt, policy) {
                    return Err(terminal);
                }
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: state.attempt,
        last: state.last_error,
    })
}
