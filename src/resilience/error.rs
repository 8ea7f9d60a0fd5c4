//! Error types for the resilience layer
//!
//! Operations executed under retry or circuit-breaker protection report
//! failures through [`OperationError`], which distinguishes plain domain
//! failures from faults carrying a [`FaultKind`]. Retry policies decide
//! retryability from the fault kind alone.

use std::fmt;

use thiserror::Error;

// == Fault Kind ==
/// Classifies a fault so policies can decide whether it is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Connection establishment or teardown failure
    Connection,
    /// Operation exceeded its time budget
    Timeout,
    /// Other I/O failure
    Io,
    /// Input rejected by the operation
    Validation,
    /// Unexpected internal failure
    Runtime,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::Connection => "connection",
            FaultKind::Timeout => "timeout",
            FaultKind::Io => "io",
            FaultKind::Validation => "validation",
            FaultKind::Runtime => "runtime",
        };
        write!(f, "{name}")
    }
}

// == Operation Error ==
/// Failure reported by a protected operation.
///
/// `Failed` is a plain domain failure: never retried, and always counted
/// against a circuit breaker. `Fault` carries a [`FaultKind`] that retry
/// and breaker policies match against their configured kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Domain-level failure with no transient-fault classification
    #[error("{0}")]
    Failed(String),

    /// Classified fault, possibly transient
    #[error("{kind} error: {message}")]
    Fault { kind: FaultKind, message: String },
}

impl OperationError {
    /// Creates a plain domain failure.
    pub fn failed(message: impl Into<String>) -> Self {
        OperationError::Failed(message.into())
    }

    /// Creates a connection fault.
    pub fn connection(message: impl Into<String>) -> Self {
        OperationError::Fault {
            kind: FaultKind::Connection,
            message: message.into(),
        }
    }

    /// Creates a timeout fault.
    pub fn timeout(message: impl Into<String>) -> Self {
        OperationError::Fault {
            kind: FaultKind::Timeout,
            message: message.into(),
        }
    }

    /// Creates an I/O fault.
    pub fn io(message: impl Into<String>) -> Self {
        OperationError::Fault {
            kind: FaultKind::Io,
            message: message.into(),
        }
    }

    /// Creates a validation fault.
    pub fn validation(message: impl Into<String>) -> Self {
        OperationError::Fault {
            kind: FaultKind::Validation,
            message: message.into(),
        }
    }

    /// Creates a runtime fault.
    pub fn runtime(message: impl Into<String>) -> Self {
        OperationError::Fault {
            kind: FaultKind::Runtime,
            message: message.into(),
        }
    }

    /// Returns the fault kind, or `None` for a plain failure.
    pub fn kind(&self) -> Option<FaultKind> {
        match self {
            OperationError::Failed(_) => None,
            OperationError::Fault { kind, .. } => Some(*kind),
        }
    }
}

impl From<std::io::Error> for OperationError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let kind = match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => FaultKind::Timeout,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => FaultKind::Connection,
            _ => FaultKind::Io,
        };

        OperationError::Fault {
            kind,
            message: err.to_string(),
        }
    }
}

// == Retry Error ==
/// Terminal outcome of a retry loop that never produced a success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Every allowed attempt was used without success
    #[error("retry failed after {attempts} attempts{}", .last.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    Exhausted {
        attempts: usize,
        last: Option<OperationError>,
    },

    /// The fault kind is not retryable under the active policy
    #[error("non-retryable error: {error}")]
    NonRetryable { error: OperationError },

    /// A retryable fault occurred on the final allowed attempt
    #[error("max retry attempts ({attempts}) exceeded: {error}")]
    MaxAttemptsExceeded {
        attempts: usize,
        error: OperationError,
    },
}

// == Breaker Error ==
/// Failure surfaced by a circuit-breaker-protected call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BreakerError {
    /// Call rejected without running: the circuit is open
    #[error("circuit breaker is open")]
    Open,

    /// A half-open probe failed before this call could run
    #[error("circuit breaker reopened due to failure in half-open state")]
    ReopenedDuringProbe,

    /// The operation ran and failed
    #[error("operation failed: {0}")]
    Operation(OperationError),
}
