//! Integration Tests for the Resilience Layer
//!
//! Exercises retry and circuit breaker together the way callers use
//! them: transient outages healing under backoff, circuits opening and
//! recovering, and the two patterns composed around one operation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::thread::sleep;
use std::time::{Duration, Instant};

use devhub_core::resilience::{
    async_with_retry, with_circuit_breaker, with_retry, BreakerError, CircuitBreaker,
    CircuitBreakerPolicy, CircuitState, OperationError, RetryError, RetryPolicy,
};
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Retry policy with millisecond backoff for wall-clock tests
fn quick_retry(max_attempts: usize) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(100),
        jitter: false,
        ..RetryPolicy::default()
    }
}

// == Retry Flow Tests ==

#[test]
fn test_retry_recovers_with_backoff() {
    init_tracing();
    let calls = AtomicUsize::new(0);
    let started = Instant::now();

    let result = with_retry(&quick_retry(3), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            Err(OperationError::connection("api unreachable"))
        } else {
            Ok("response")
        }
    });

    assert_eq!(result, Ok("response"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Two backoffs were slept: 5ms then 10ms
    assert!(started.elapsed() >= Duration::from_millis(15));
}

#[test]
fn test_network_preset_shape() {
    let policy = RetryPolicy::for_network();

    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.base_delay, Duration::from_millis(500));
    assert_eq!(policy.max_delay, Duration::from_secs(10));
    assert!(policy.jitter);
}

#[tokio::test(start_paused = true)]
async fn test_transient_outage_recovers_with_default_policy() {
    let policy = RetryPolicy {
        jitter: false,
        ..RetryPolicy::default()
    };
    let calls = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();

    let result = async_with_retry(&policy, || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(OperationError::timeout("poll timed out"))
            } else {
                Ok("synced")
            }
        }
    })
    .await;

    assert_eq!(result, Ok("synced"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Default backoff: 1s before the second attempt, 2s before the third
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

// == Circuit Breaker Timeline Tests ==

#[test]
fn test_breaker_opens_after_two_failures() {
    let breaker = CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 2,
        ..CircuitBreakerPolicy::default()
    });
    let executed = AtomicUsize::new(0);

    for _ in 0..2 {
        let result: Result<(), _> = breaker.call(|| {
            executed.fetch_add(1, Ordering::SeqCst);
            Err(OperationError::connection("service down"))
        });
        assert!(matches!(result, Err(BreakerError::Operation(_))));
    }

    assert_eq!(breaker.get_state().state, CircuitState::Open);

    let result: Result<(), _> = breaker.call(|| {
        executed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    assert_eq!(result, Err(BreakerError::Open));
    assert_eq!(executed.load(Ordering::SeqCst), 2, "Rejected call must not run");
}

#[test]
fn test_breaker_full_recovery_cycle() {
    init_tracing();
    let breaker = CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 1,
        success_threshold: 2,
        timeout: Duration::from_millis(100),
        ..CircuitBreakerPolicy::default()
    });

    let _: Result<(), _> = breaker.call(|| Err(OperationError::connection("down")));
    assert_eq!(breaker.get_state().state, CircuitState::Open);

    let early: Result<(), _> = breaker.call(|| Ok(()));
    assert_eq!(early, Err(BreakerError::Open));

    sleep(Duration::from_millis(150));

    assert!(breaker.call(|| Ok::<_, OperationError>("probe 1")).is_ok());
    assert_eq!(breaker.get_state().state, CircuitState::HalfOpen);

    assert!(breaker.call(|| Ok::<_, OperationError>("probe 2")).is_ok());
    assert_eq!(breaker.get_state().state, CircuitState::Closed);

    let result = breaker.call(|| Ok::<_, OperationError>("normal traffic"));
    assert_eq!(result.unwrap(), "normal traffic");
}

// == Composition Tests ==

#[test]
fn test_retry_through_open_breaker_until_probe() {
    init_tracing();
    let breaker = CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 2,
        success_threshold: 2,
        timeout: Duration::from_millis(50),
        ..CircuitBreakerPolicy::default()
    });
    let service_calls = AtomicUsize::new(0);

    // The breaker opens after two real failures; retry keeps knocking
    // through the open window until the probe succeeds
    let result = with_retry(&quick_retry(5), || {
        breaker
            .call(|| {
                let n = service_calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(OperationError::connection("deploy agent unreachable"))
                } else {
                    Ok("deployed")
                }
            })
            .map_err(|e| match e {
                BreakerError::Operation(inner) => inner,
                rejected => OperationError::connection(rejected.to_string()),
            })
    });

    assert_eq!(result, Ok("deployed"));
    assert_eq!(
        service_calls.load(Ordering::SeqCst),
        3,
        "Open-circuit rejections must not reach the service"
    );

    let snapshot = breaker.get_state();
    assert_eq!(snapshot.state, CircuitState::HalfOpen);
    assert_eq!(snapshot.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_async_retry_gives_up_when_breaker_stays_open() {
    let breaker = CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 2,
        timeout: Duration::from_secs(600),
        ..CircuitBreakerPolicy::default()
    });
    let policy = RetryPolicy {
        max_attempts: 4,
        jitter: false,
        ..RetryPolicy::default()
    };
    let service_calls = AtomicUsize::new(0);

    let result: Result<(), RetryError> = async_with_retry(&policy, || async {
        breaker
            .call_async(|| async {
                service_calls.fetch_add(1, Ordering::SeqCst);
                Err(OperationError::connection("registry offline"))
            })
            .await
            .map_err(|e| match e {
                BreakerError::Operation(inner) => inner,
                rejected => OperationError::connection(rejected.to_string()),
            })
    })
    .await;

    assert!(matches!(
        result,
        Err(RetryError::MaxAttemptsExceeded { attempts: 4, .. })
    ));
    assert_eq!(
        service_calls.load(Ordering::SeqCst),
        2,
        "Only pre-open attempts reach the service"
    );
    assert_eq!(breaker.get_state().state, CircuitState::Open);
}

// == Concurrency Tests ==

#[test]
fn test_breaker_under_concurrent_failures() {
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 5,
        timeout: Duration::from_secs(3600),
        ..CircuitBreakerPolicy::default()
    }));
    let executed = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..8 {
            let breaker = Arc::clone(&breaker);
            let executed = &executed;
            let rejected = &rejected;
            scope.spawn(move || {
                for _ in 0..10 {
                    let result: Result<(), _> = breaker.call(|| {
                        executed.fetch_add(1, Ordering::SeqCst);
                        Err(OperationError::connection("down"))
                    });
                    if matches!(result, Err(BreakerError::Open)) {
                        rejected.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(breaker.get_state().state, CircuitState::Open);

    // Five failures trip the circuit; calls already admitted may still
    // finish, one per remaining thread at most
    let ran = executed.load(Ordering::SeqCst);
    assert!(ran >= 5, "Threshold failures must execute, ran {ran}");
    assert!(ran <= 12, "Open circuit leaked calls, ran {ran}");
    assert!(rejected.load(Ordering::SeqCst) > 0);
}

// == Error Surface Tests ==

#[test]
fn test_terminal_error_messages() {
    let policy = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
        jitter: false,
        ..RetryPolicy::default()
    };

    let err = with_retry(&policy, || {
        Err::<(), _>(OperationError::timeout("deadline passed"))
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "max retry attempts (2) exceeded: timeout error: deadline passed"
    );

    let err = with_retry(&policy, || {
        Err::<(), _>(OperationError::failed("not found"))
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "retry failed after 2 attempts: not found");

    let breaker = CircuitBreaker::new(CircuitBreakerPolicy {
        failure_threshold: 1,
        ..CircuitBreakerPolicy::default()
    });
    let _: Result<(), _> = breaker.call(|| Err(OperationError::io("disk error")));
    let err = breaker.call(|| Ok::<_, OperationError>(())).unwrap_err();
    assert_eq!(err.to_string(), "circuit breaker is open");
}

#[test]
fn test_with_circuit_breaker_functional_style() {
    let breaker = CircuitBreaker::default();

    let result = with_circuit_breaker(&breaker, || Ok::<_, OperationError>("data"));
    assert_eq!(result.unwrap(), "data");

    let result: Result<(), _> =
        with_circuit_breaker(&breaker, || Err(OperationError::validation("rejected")));
    assert!(matches!(result, Err(BreakerError::Operation(_))));
}
