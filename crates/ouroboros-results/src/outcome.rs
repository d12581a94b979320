//! Job outcomes as handed over by the framework

use serde::{Deserialize, Serialize};

use crate::ResultStatus;

/// Failure descriptor stored in place of a return value when a job fails.
///
/// Mirrors an exception record: a type name, a message and an optional
/// formatted traceback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDescriptor {
    /// Error type or class name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl FailureDescriptor {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}

impl std::fmt::Display for FailureDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl<E: std::error::Error> From<&E> for FailureDescriptor {
    fn from(err: &E) -> Self {
        let kind = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();
        Self::new(kind, err.to_string())
    }
}

/// Outcome of a job's execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Job returned a value
    Success(serde_json::Value),
    /// Job raised an error
    Failure(FailureDescriptor),
}

impl JobOutcome {
    pub fn success(value: serde_json::Value) -> Self {
        JobOutcome::Success(value)
    }

    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        JobOutcome::Failure(FailureDescriptor::new(kind, message))
    }

    /// Status column value for this outcome
    pub fn status(&self) -> ResultStatus {
        match self {
            JobOutcome::Success(_) => ResultStatus::Success,
            JobOutcome::Failure(_) => ResultStatus::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }
}

impl<E: std::error::Error> From<std::result::Result<serde_json::Value, E>> for JobOutcome {
    fn from(result: std::result::Result<serde_json::Value, E>) -> Self {
        match result {
            Ok(value) => JobOutcome::Success(value),
            Err(err) => JobOutcome::Failure(FailureDescriptor::from(&err)),
        }
    }
}
