//! Error types for the exercise harness.

use thiserror::Error;

/// Errors that can occur while checking a submission.
///
/// An error raised by the learner's own code is not an `Err`: it is recorded
/// in [`ExecutionResult::error`](crate::harness::executor::ExecutionResult)
/// so the presenter can show it next to the captured output. The variants
/// here cover everything that stops a run before or outside the learner's
/// code.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The submission was blank or whitespace only. Rejected before the
    /// safety filter or the runtime are consulted.
    #[error("submission is empty")]
    EmptySubmission,

    /// The static safety filter rejected the submission.
    #[error("submission rejected: {construct}")]
    UnsafeSubmission {
        /// Diagnostic naming the offending construct.
        construct: String,
    },

    /// The shared interpreter runtime could not be initialized.
    #[error("Python runtime unavailable: {0}")]
    RuntimeUnavailable(#[source] anyhow::Error),

    /// The interpreter wasm asset was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),

    /// The run exceeded the configured deadline.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The run exceeded the configured memory cap.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// The run exhausted its instruction budget.
    #[error("execution ran out of fuel")]
    OutOfFuel,

    /// The interpreter failed in a way that is not the submission's fault.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// I/O error while loading the interpreter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    /// Check if this error represents an empty submission.
    pub fn is_empty_submission(&self) -> bool {
        matches!(self, HarnessError::EmptySubmission)
    }

    /// Check if this error represents a safety-filter rejection.
    pub fn is_unsafe_submission(&self) -> bool {
        matches!(self, HarnessError::UnsafeSubmission { .. })
    }

    /// Check if this error means the runtime could not be loaded at all.
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(
            self,
            HarnessError::RuntimeUnavailable(_) | HarnessError::InterpreterNotFound(_)
        )
    }

    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout(_))
    }

    /// Check if this error represents a memory limit exceeded.
    pub fn is_memory_limit(&self) -> bool {
        matches!(self, HarnessError::MemoryLimitExceeded(_))
    }
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
