//! Job identifiers

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::{ResultError, Result};

/// Maximum length of a job identifier in bytes (matches the `job_id` column)
pub const MAX_JOB_ID_LEN: usize = 256;

/// Opaque unique job identifier assigned by the broker before the job runs.
///
/// The store treats it as an opaque string key. Brokers that do not have a
/// single natural identifier can derive one with [`JobId::for_message`].
///
/// The `From` conversions do not check the length; the gateway and the
/// PostgreSQL store call [`JobId::validate`] before using an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new time-ordered job ID (UUID v7)
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Parse and validate an identifier supplied by a broker
    pub fn parse(s: &str) -> Result<Self> {
        let id = Self(s.to_string());
        id.validate()?;
        Ok(id)
    }

    /// Check the identifier fits the `job_id` column.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(ResultError::InvalidJobId(
                "Job ID cannot be empty".to_string(),
            ));
        }
        if self.0.len() > MAX_JOB_ID_LEN {
            return Err(ResultError::InvalidJobId(format!(
                "Job ID of {} bytes exceeds maximum length of {} bytes",
                self.0.len(),
                MAX_JOB_ID_LEN
            )));
        }
        Ok(())
    }

    /// Derive a stable key from a message's identity.
    ///
    /// The key is the hex SHA-256 digest of the namespace, queue, actor and
    /// message id, so it is always 64 characters regardless of input size.
    pub fn for_message(namespace: &str, queue: &str, actor: &str, message_id: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [namespace, queue, actor, message_id] {
            hasher.update(part.as_bytes());
            // Separator keeps ("ab", "c") and ("a", "bc") apart
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        let hex = digest.iter().map(|b| format!("{:02x}", b)).collect::<String>();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<uuid::Uuid> for JobId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let id = Self(raw);
        id.validate().map_err(serde::de::Error::custom)?;
        Ok(id)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_rejects_empty_and_oversized() {
        assert!(matches!(JobId::parse(""), Err(ResultError::InvalidJobId(_))));
        assert!(matches!(
            JobId::parse(&"x".repeat(MAX_JOB_ID_LEN + 1)),
            Err(ResultError::InvalidJobId(_))
        ));
        assert!(JobId::parse(&"x".repeat(MAX_JOB_ID_LEN)).is_ok());
    }

    #[test]
    fn test_validate_catches_unchecked_conversions() {
        assert!(JobId::from("job-1").validate().is_ok());
        let oversized = JobId::from("x".repeat(MAX_JOB_ID_LEN + 1));
        assert!(matches!(oversized.validate(), Err(ResultError::InvalidJobId(_))));
        assert!(JobId::from(String::new()).validate().is_err());
    }

    #[test]
    fn test_deserialize_validates_length() {
        let id: JobId = serde_json::from_str("\"job-7\"").unwrap();
        assert_eq!(id.as_str(), "job-7");

        let oversized = format!("\"{}\"", "x".repeat(MAX_JOB_ID_LEN + 1));
        let err = serde_json::from_str::<JobId>(&oversized).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
        assert!(serde_json::from_str::<JobId>("\"\"").is_err());
    }

    #[test]
    fn test_message_key_is_stable() {
        let a = JobId::for_message("results", "default", "add", "m-1");
        let b = JobId::for_message("results", "default", "add", "m-1");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_message_key_separates_components() {
        let a = JobId::for_message("results", "ab", "c", "m-1");
        let b = JobId::for_message("results", "a", "bc", "m-1");
        assert_ne!(a, b);

        let other_ns = JobId::for_message("other", "default", "add", "m-1");
        let same = JobId::for_message("results", "default", "add", "m-1");
        assert_ne!(other_ns, same);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = JobId::from("job-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"job-42\"");
    }
}
