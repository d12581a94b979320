//! In-memory result store (thread-safe, non-distributed)
//!
//! Useful for tests and single-process deployments. Same semantics as the
//! PostgreSQL store: upsert on write, expiry applied at read time, sweep
//! scoped by timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use super::ResultStore;
use crate::{JobId, Result, ResultRecord, ResultStatus};

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<JobId, ResultRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing TTL computation
    pub fn insert_record(&self, record: ResultRecord) {
        self.records.insert(record.job_id.clone(), record);
    }

    /// Number of physically stored rows (including expired ones)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw row lookup, ignoring expiry
    pub fn get_raw(&self, job_id: &JobId) -> Option<ResultRecord> {
        self.records.get(job_id).map(|entry| entry.value().clone())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.records.len())
            .finish()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn write(
        &self,
        job_id: &JobId,
        payload: &[u8],
        status: ResultStatus,
        ttl: Duration,
    ) -> Result<()> {
        job_id.validate()?;
        let record = ResultRecord::new(job_id.clone(), status, payload.to_vec(), Utc::now(), ttl);
        tracing::debug!(job_id = %job_id, status = %status, "Storing result");
        // Whole-value replacement under the shard lock
        self.records.insert(job_id.clone(), record);
        Ok(())
    }

    async fn read(&self, job_id: &JobId) -> Result<Option<ResultRecord>> {
        let now = Utc::now();
        Ok(self
            .records
            .get(job_id)
            .filter(|entry| !entry.value().is_expired_at(now))
            .map(|entry| entry.value().clone()))
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        let removed = before.saturating_sub(self.records.len()) as u64;

        if removed > 0 {
            tracing::debug!(removed = removed, "Swept expired results");
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_expiring_at(job_id: &str, expires_at: DateTime<Utc>) -> ResultRecord {
        ResultRecord {
            job_id: JobId::from(job_id),
            status: ResultStatus::Success,
            payload: b"1".to_vec(),
            written_at: expires_at - chrono::Duration::seconds(60),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        let job_id = JobId::from("job-1");

        store
            .write(&job_id, b"42", ResultStatus::Success, Duration::from_secs(60))
            .await
            .unwrap();

        let record = store.read(&job_id).await.unwrap().expect("record should exist");
        assert_eq!(record.payload, b"42".to_vec());
        assert_eq!(record.status, ResultStatus::Success);
        assert!(record.expires_at > record.written_at);
    }

    #[tokio::test]
    async fn test_write_replaces_existing_row() {
        let store = MemoryStore::new();
        let job_id = JobId::from("job-1");

        store
            .write(&job_id, b"\"first\"", ResultStatus::Failure, Duration::from_secs(60))
            .await
            .unwrap();
        store
            .write(&job_id, b"\"second\"", ResultStatus::Success, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let record = store.read(&job_id).await.unwrap().unwrap();
        assert_eq!(record.payload, b"\"second\"".to_vec());
        assert_eq!(record.status, ResultStatus::Success);
    }

    #[tokio::test]
    async fn test_read_hides_expired_rows_before_sweep() {
        let store = MemoryStore::new();
        store.insert_record(record_expiring_at(
            "old",
            Utc::now() - chrono::Duration::seconds(1),
        ));

        assert!(store.read(&JobId::from("old")).await.unwrap().is_none());
        // Still physically present until swept
        assert_eq!(store.len(), 1);
        assert!(store.get_raw(&JobId::from("old")).is_some());
    }

    #[tokio::test]
    async fn test_sweep_only_removes_rows_expired_before_now() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_record(record_expiring_at("expired", now - chrono::Duration::seconds(1)));
        store.insert_record(record_expiring_at("boundary", now));
        store.insert_record(record_expiring_at("live", now + chrono::Duration::seconds(1)));

        let removed = store.sweep(now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_raw(&JobId::from("expired")).is_none());
        assert!(store.get_raw(&JobId::from("boundary")).is_some());
        assert!(store.get_raw(&JobId::from("live")).is_some());

        // Idempotent
        assert_eq!(store.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_rejects_oversized_job_id() {
        let store = MemoryStore::new();
        let job_id = JobId::from("x".repeat(crate::job::MAX_JOB_ID_LEN + 1));

        let err = store
            .write(&job_id, b"1", ResultStatus::Success, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ResultError::InvalidJobId(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_rows() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .write(&JobId::from("j"), b"1", ResultStatus::Success, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(other.read(&JobId::from("j")).await.unwrap().is_some());
        assert!(other.ping().await.is_ok());
    }
}
