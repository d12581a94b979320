//! Framework-facing result backend contract
//!
//! Brokers and worker middleware only need two hooks: one to hand over a
//! finished job's outcome, one to fetch it for a waiting caller. Keeping
//! them behind a trait lets the worker hold an `Arc<dyn ResultBackend>`
//! without knowing which store or codec sits underneath.

use async_trait::async_trait;
use std::time::Duration;

use crate::store::ResultStore;
use crate::{JobId, JobOutcome, Result, ResultCodec, ResultGateway};

/// Result backend trait
#[async_trait]
pub trait ResultBackend: Send + Sync {
    /// Called once per job completion (possibly more under redelivery).
    /// `ttl = None` uses the backend's default.
    async fn on_job_complete(
        &self,
        job_id: &JobId,
        outcome: JobOutcome,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Fetch a job's result, optionally waiting for it.
    /// `timeout = None` uses the backend's default.
    async fn fetch_result(
        &self,
        job_id: &JobId,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value>;

    /// Health check
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<S: ResultStore, C: ResultCodec> ResultBackend for ResultGateway<S, C> {
    async fn on_job_complete(
        &self,
        job_id: &JobId,
        outcome: JobOutcome,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.put(job_id, &outcome, ttl).await
    }

    async fn fetch_result(
        &self,
        job_id: &JobId,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        self.get(job_id, block, timeout).await
    }

    async fn health_check(&self) -> Result<()> {
        ResultGateway::health_check(self).await
    }
}
