//! Result backend error types

use std::time::Duration;
use thiserror::Error;

use crate::{FailureDescriptor, JobId};

/// Result type alias for result backend operations
pub type Result<T> = std::result::Result<T, ResultError>;

/// Every condition a caller of the result backend can observe.
///
/// Read-side conditions are reported distinctly and never collapse into one
/// another: a timeout is not a failure, a corrupt payload is not absence.
#[derive(Error, Debug, Clone)]
pub enum ResultError {
    /// Persistence layer unreachable or a statement failed.
    #[error("Result store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        /// Whether retrying the same operation may succeed.
        transient: bool,
    },

    #[error("Result not ready for job {0}")]
    ResultNotReady(JobId),

    #[error("Timed out after {waited:?} waiting for result of job {job_id}")]
    ResultTimeout { job_id: JobId, waited: Duration },

    #[error("Job {job_id} failed: {failure}")]
    JobFailed {
        job_id: JobId,
        failure: FailureDescriptor,
    },

    #[error("Corrupt result for job {job_id}: {reason}")]
    CorruptResult { job_id: JobId, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Job identifier rejected before reaching the store.
    #[error("Invalid job ID: {0}")]
    InvalidJobId(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Wait for result of job {0} was cancelled")]
    Cancelled(JobId),
}

impl ResultError {
    /// Transient store error (retryable)
    pub fn transient(message: impl Into<String>) -> Self {
        ResultError::StoreUnavailable {
            message: message.into(),
            transient: true,
        }
    }

    /// Store error that will not go away on retry
    pub fn unavailable(message: impl Into<String>) -> Self {
        ResultError::StoreUnavailable {
            message: message.into(),
            transient: false,
        }
    }

    /// Returns true if a polling loop may absorb this error and try again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResultError::StoreUnavailable {
                transient: true,
                ..
            }
        )
    }

    /// Returns true for errors raised by the persistence layer
    pub fn is_store_error(&self) -> bool {
        matches!(self, ResultError::StoreUnavailable { .. })
    }
}

impl From<serde_json::Error> for ResultError {
    fn from(err: serde_json::Error) -> Self {
        ResultError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for ResultError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error;
        match &err {
            Error::Configuration(_) => ResultError::Configuration(err.to_string()),
            Error::Database(db_err) => {
                // See: https://www.postgresql.org/docs/current/errcodes-appendix.html
                if let Some(code) = db_err.code() {
                    let code_str: &str = &code;
                    match code_str {
                        // Serialization failure / deadlock / other rollbacks
                        code if code.starts_with("40") => {
                            return ResultError::transient(err.to_string())
                        }
                        // Connection exceptions
                        code if code.starts_with("08") => {
                            return ResultError::transient(err.to_string())
                        }
                        // Admin shutdown, crash shutdown, cannot connect now
                        "57P01" | "57P02" | "57P03" => {
                            return ResultError::transient(err.to_string())
                        }
                        _ => {}
                    }
                }
                ResultError::unavailable(err.to_string())
            }
            Error::Io(_) | Error::Tls(_) | Error::Protocol(_) => {
                ResultError::transient(err.to_string())
            }
            Error::PoolTimedOut => ResultError::transient("Connection pool timed out"),
            Error::PoolClosed => ResultError::unavailable("Connection pool closed"),
            Error::WorkerCrashed => ResultError::unavailable("Connection worker crashed"),
            _ => ResultError::unavailable(err.to_string()),
        }
    }
}
