//! Result store implementations
//!
//! A store persists at most one result row per job and knows nothing about
//! blocking, codecs or the framework. The gateway builds those on top.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::{JobId, Result, ResultRecord, ResultStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Durable, race-safe single-row persistence keyed by job identifier.
#[async_trait]
pub trait ResultStore: Send + Sync + 'static {
    /// Upsert the result for `job_id`, replacing any previous row entirely.
    ///
    /// `expires_at` is computed as now + `ttl`. Concurrent writes for the same
    /// job never fail; the last one to commit wins.
    async fn write(
        &self,
        job_id: &JobId,
        payload: &[u8],
        status: ResultStatus,
        ttl: Duration,
    ) -> Result<()>;

    /// Point lookup. Expired rows read as absent whether or not a sweep has
    /// removed them yet.
    async fn read(&self, job_id: &JobId) -> Result<Option<ResultRecord>>;

    /// Delete every row with `expires_at < now`, returning how many went.
    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Health check
    async fn ping(&self) -> Result<()>;
}
