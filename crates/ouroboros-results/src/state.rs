//! Stored result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{JobId, ResultError, Result};

/// Status of a materialized result row.
///
/// "Not finished" is represented by the absence of a row, never by a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Payload holds the job's return value
    Success,
    /// Payload holds a [`crate::FailureDescriptor`]
    Failure,
}

impl ResultStatus {
    /// Value stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Failure => "failure",
        }
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResultStatus {
    type Err = ResultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(ResultStatus::Success),
            "failure" => Ok(ResultStatus::Failure),
            other => Err(ResultError::unavailable(format!(
                "Unknown result status '{}' in store",
                other
            ))),
        }
    }
}

/// One stored result row
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub job_id: JobId,
    pub status: ResultStatus,
    /// Codec-encoded payload, opaque to the store
    pub payload: Vec<u8>,
    pub written_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Build a record written at `now` that lives for `ttl`
    pub fn new(
        job_id: JobId,
        status: ResultStatus,
        payload: Vec<u8>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            job_id,
            status,
            payload,
            written_at: now,
            expires_at: expiry_from(now, ttl),
        }
    }

    /// A record is live up to and including its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Compute `now + ttl`, saturating at the maximum representable timestamp.
pub fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
