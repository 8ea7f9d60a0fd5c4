//! Circuit Breaker Module
//!
//! Protects operations from cascading failures. The breaker tracks
//! consecutive failures and moves between three states: closed (calls
//! pass through), open (calls are rejected outright), and half-open
//! (a limited probe decides whether the downstream has recovered).
//!
//! State handling is split in two layers: [`CircuitBreakerState`] is an
//! immutable value with pure transition methods, and [`CircuitBreaker`]
//! owns one behind a mutex and applies the policy to it.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::resilience::error::{BreakerError, FaultKind, OperationError};

// == Circuit State ==
/// The three positions of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; failures are being counted
    Closed,
    /// Calls are rejected until the timeout elapses
    Open,
    /// Probe calls are allowed to test for recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        write!(f, "{name}")
    }
}

// == Circuit Breaker Policy ==
/// Thresholds and timing for the breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Successes required in half-open before closing
    pub success_threshold: u32,
    /// Time the circuit stays open before allowing a probe
    pub timeout: Duration,
    /// Fault kinds that count against the circuit
    pub expected_kinds: Vec<FaultKind>,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        CircuitBreakerPolicy {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
            expected_kinds: vec![FaultKind::Connection, FaultKind::Timeout, FaultKind::Io],
        }
    }
}

impl CircuitBreakerPolicy {
    /// Returns true when a fault of `kind` counts as a circuit failure.
    pub fn is_expected(&self, kind: FaultKind) -> bool {
        self.expected_kinds.contains(&kind)
    }
}

// == Circuit Breaker State ==
/// Immutable snapshot of the breaker's position and counters.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerState {
    /// Current circuit position
    pub state: CircuitState,
    /// Consecutive failures observed
    pub failure_count: u32,
    /// Consecutive successes observed in half-open
    pub success_count: u32,
    /// When the most recent counted failure happened
    pub last_failure_time: Option<Instant>,
    /// When the circuit last changed position
    pub last_state_change: Instant,
}

impl CircuitBreakerState {
    pub fn new() -> Self {
        CircuitBreakerState {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            last_state_change: Instant::now(),
        }
    }

    /// Returns the state after a successful operation.
    ///
    /// In half-open the success streak grows; anywhere else a success
    /// simply clears both counters.
    pub fn with_success(self) -> Self {
        if self.state == CircuitState::HalfOpen {
            CircuitBreakerState {
                success_count: self.success_count + 1,
                failure_count: 0,
                ..self
            }
        } else {
            CircuitBreakerState {
                failure_count: 0,
                success_count: 0,
                ..self
            }
        }
    }

    /// Returns the state after a counted failure.
    pub fn with_failure(self) -> Self {
        CircuitBreakerState {
            failure_count: self.failure_count + 1,
            success_count: 0,
            last_failure_time: Some(Instant::now()),
            ..self
        }
    }

    /// Returns the state moved to `new_state` with counters cleared.
    pub fn transition_to(self, new_state: CircuitState) -> Self {
        CircuitBreakerState {
            state: new_state,
            failure_count: 0,
            success_count: 0,
            last_state_change: Instant::now(),
            ..self
        }
    }

    /// True when an open circuit has cooled down long enough to probe.
    pub fn should_transition_to_half_open(&self, timeout: Duration) -> bool {
        self.state == CircuitState::Open
            && self
                .last_failure_time
                .is_some_and(|at| at.elapsed() >= timeout)
    }
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        CircuitBreakerState::new()
    }
}

// == Circuit Breaker ==
/// Thread-safe circuit breaker.
///
/// Operations run outside the internal lock, so a slow call never blocks
/// other callers from reading or updating breaker state.
pub struct CircuitBreaker {
    policy: CircuitBreakerPolicy,
    state: Mutex<CircuitBreakerState>,
}

impl CircuitBreaker {
    /// Creates a breaker with the given policy.
    pub fn new(policy: CircuitBreakerPolicy) -> Self {
        CircuitBreaker {
            policy,
            state: Mutex::new(CircuitBreakerState::new()),
        }
    }

    /// Executes `operation` through the breaker.
    ///
    /// An open circuit rejects the call before it runs. Successes and
    /// counted failures feed the state machine; faults whose kind is not
    /// in `expected_kinds` are returned to the caller without affecting
    /// the circuit.
    ///
    /// # Arguments
    /// * `operation` - Fallible operation to protect
    ///
    /// # Returns
    /// * `Ok(T)` - The operation ran and succeeded
    /// * `Err(BreakerError)` - Rejected by the breaker, or ran and failed
    pub fn call<T, F>(&self, operation: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Result<T, OperationError>,
    {
        self.check_admission()?;

        // Run outside the lock so slow operations never block state access
        let result = operation();

        self.record_outcome(&result);
        result.map_err(BreakerError::Operation)
    }

    /// Async counterpart of [`call`](CircuitBreaker::call).
    ///
    /// The lock is never held across an await point.
    pub async fn call_async<T, F, Fut>(&self, operation: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.check_admission()?;

        let result = operation().await;

        self.record_outcome(&result);
        result.map_err(BreakerError::Operation)
    }

    /// Decides whether a call may proceed, applying timed transitions.
    fn check_admission(&self) -> Result<(), BreakerError> {
        let mut state = self.state.lock();

        if state.should_transition_to_half_open(self.policy.timeout) {
            info!("Circuit breaker timeout elapsed, allowing probe calls");
            *state = state.transition_to(CircuitState::HalfOpen);
        }

        if state.state == CircuitState::Open {
            return Err(BreakerError::Open);
        }

        // A failure already recorded during this probe window wins
        if state.state == CircuitState::HalfOpen && state.failure_count > 0 {
            *state = state.transition_to(CircuitState::Open);
            return Err(BreakerError::ReopenedDuringProbe);
        }

        Ok(())
    }

    /// Feeds an operation outcome into the state machine.
    fn record_outcome<T>(&self, result: &Result<T, OperationError>) {
        let mut state = self.state.lock();

        match result {
            Ok(_) => self.record_success(&mut state),
            Err(error) => match error.kind() {
                // Plain failures always count against the circuit
                None => self.record_failure(&mut state),
                Some(kind) if self.policy.is_expected(kind) => self.record_failure(&mut state),
                Some(_) => {}
            },
        }
    }

    fn record_success(&self, state: &mut CircuitBreakerState) {
        *state = state.with_success();

        if state.state == CircuitState::HalfOpen
            && state.success_count >= self.policy.success_threshold
        {
            info!(
                successes = state.success_count,
                "Circuit breaker closing after successful probes"
            );
            *state = state.transition_to(CircuitState::Closed);
        }
    }

    fn record_failure(&self, state: &mut CircuitBreakerState) {
        *state = state.with_failure();

        if state.state == CircuitState::Closed
            && state.failure_count >= self.policy.failure_threshold
        {
            warn!(
                failures = state.failure_count,
                "Circuit breaker opening after repeated failures"
            );
            *state = state.transition_to(CircuitState::Open);
        } else if state.state == CircuitState::HalfOpen {
            // A single failed probe reopens the circuit
            warn!("Circuit breaker reopening after failed probe");
            *state = state.transition_to(CircuitState::Open);
        }
    }

    /// Returns a snapshot of the current state.
    pub fn get_state(&self) -> CircuitBreakerState {
        *self.state.lock()
    }

    /// Forces the breaker back to a fresh closed state.
    pub fn reset(&self) {
        *self.state.lock() = CircuitBreakerState::new();
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, new_state: CircuitBreakerState) {
        *self.state.lock() = new_state;
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        CircuitBreaker::new(CircuitBreakerPolicy::default())
    }
}

// == Convenience Wrapper ==
/// Executes `operation` through `breaker`.
///
/// Functional-style shorthand for [`CircuitBreaker::call`].
pub fn with_circuit_breaker<T, F>(
    breaker: &CircuitBreaker,
    operation: F,
) -> Result<T, BreakerError>
where
    F: FnOnce() -> Result<T, OperationError>,
{
    breaker.call(operation)
}
