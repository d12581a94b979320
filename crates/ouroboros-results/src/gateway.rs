//! Result gateway
//!
//! The framework-facing half of the backend. Wraps a [`ResultStore`] with
//! outcome encoding, failure propagation and the blocking poll loop.
//!
//! # Example
//! ```rust,ignore
//! let gateway = ResultGateway::connect(&BackendConfig::from_env()?).await?;
//!
//! gateway.put(&job_id, &JobOutcome::success(json!(42)), None).await?;
//! let value = gateway.get(&job_id, true, Some(Duration::from_secs(5))).await?;
//! ```

use futures::future::join_all;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::{DEFAULT_TIMEOUT, DEFAULT_TTL};
use crate::store::{PostgresStore, ResultStore};
use crate::{
    BackendConfig, FailureDescriptor, JobId, JobOutcome, JsonCodec, PollPolicy, Result,
    ResultCodec, ResultError, ResultRecord, ResultStatus,
};

/// Stores and retrieves job outcomes on top of a [`ResultStore`].
///
/// Cheap to clone; clones share the underlying store.
pub struct ResultGateway<S, C = JsonCodec> {
    store: Arc<S>,
    codec: Arc<C>,
    default_ttl: Duration,
    default_timeout: Duration,
    poll: PollPolicy,
}

impl<S, C> Clone for ResultGateway<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
            default_ttl: self.default_ttl,
            default_timeout: self.default_timeout,
            poll: self.poll.clone(),
        }
    }
}

impl<S, C: ResultCodec> std::fmt::Debug for ResultGateway<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultGateway")
            .field("codec", &self.codec.name())
            .field("default_ttl", &self.default_ttl)
            .field("default_timeout", &self.default_timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ResultGateway<PostgresStore> {
    /// Connect a PostgreSQL store and wrap it with the configured defaults.
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let store = PostgresStore::connect(config).await?;
        Self::from_config(Arc::new(store), config)
    }
}

impl<S: ResultStore> ResultGateway<S> {
    /// Gateway with the default TTL, timeout and poll policy.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            codec: Arc::new(JsonCodec),
            default_ttl: DEFAULT_TTL,
            default_timeout: DEFAULT_TIMEOUT,
            poll: PollPolicy::default(),
        }
    }

    /// Gateway taking its defaults from a validated configuration.
    pub fn from_config(store: Arc<S>, config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store)
            .default_ttl(config.default_ttl)
            .default_timeout(config.default_timeout)
            .poll_policy(config.poll.clone()))
    }
}

impl<S: ResultStore, C: ResultCodec> ResultGateway<S, C> {
    /// Swap the payload codec.
    pub fn with_codec<C2: ResultCodec>(self, codec: C2) -> ResultGateway<S, C2> {
        ResultGateway {
            store: self.store,
            codec: Arc::new(codec),
            default_ttl: self.default_ttl,
            default_timeout: self.default_timeout,
            poll: self.poll,
        }
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Record a job's outcome. Repeated calls for the same job replace the
    /// stored result; the last write wins.
    pub async fn put(
        &self,
        job_id: &JobId,
        outcome: &JobOutcome,
        ttl: Option<Duration>,
    ) -> Result<()> {
        job_id.validate()?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let (status, value) = match outcome {
            JobOutcome::Success(value) => (ResultStatus::Success, Cow::Borrowed(value)),
            JobOutcome::Failure(failure) => (
                ResultStatus::Failure,
                Cow::Owned(serde_json::to_value(failure)?),
            ),
        };
        let payload = self.codec.encode(&value)?;

        debug!(
            job_id = %job_id,
            status = %status,
            ttl_ms = ttl.as_millis() as u64,
            codec = self.codec.name(),
            "Putting result"
        );
        self.store.write(job_id, &payload, status, ttl).await
    }

    /// Fetch a job's result.
    ///
    /// With `block = false` this is a single read: an absent (or expired)
    /// result is [`ResultError::ResultNotReady`]. With `block = true` the
    /// store is polled until the result appears or `timeout` (default: the
    /// configured timeout) elapses, which is [`ResultError::ResultTimeout`].
    pub async fn get(
        &self,
        job_id: &JobId,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        self.get_with_cancel(job_id, block, timeout, &CancellationToken::new())
            .await
    }

    /// Same as [`ResultGateway::get`], abandoning the wait as soon as
    /// `cancel` fires.
    #[instrument(skip(self, job_id, cancel), fields(job_id = %job_id))]
    pub async fn get_with_cancel(
        &self,
        job_id: &JobId,
        block: bool,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value> {
        job_id.validate()?;

        if !block {
            return match self.store.read(job_id).await? {
                Some(record) => self.decode(record),
                None => Err(ResultError::ResultNotReady(job_id.clone())),
            };
        }

        let timeout = timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        // A timeout too large to represent means no deadline at all.
        let deadline = started.checked_add(timeout);
        let budget = self.poll.transient_error_budget;
        let mut attempt: u32 = 0;
        let mut consecutive_errors: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ResultError::Cancelled(job_id.clone()));
            }

            // The read itself is bounded by the deadline and the token; a
            // hung connection must not hold the caller past either.
            let read = async {
                match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, self.store.read(job_id))
                        .await
                        .ok(),
                    None => Some(self.store.read(job_id).await),
                }
            };
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Wait for result cancelled");
                    return Err(ResultError::Cancelled(job_id.clone()));
                }
                result = read => result,
            };

            let last_error = match result {
                Some(Ok(Some(record))) => return self.decode(record),
                Some(Ok(None)) => {
                    consecutive_errors = 0;
                    None
                }
                Some(Err(e)) if e.is_transient() && consecutive_errors < budget => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = attempt,
                        consecutive_errors = consecutive_errors,
                        budget = budget,
                        error = %e,
                        "Transient store error while waiting for result"
                    );
                    Some(e)
                }
                Some(Err(e)) => return Err(e),
                // Read cut off by the deadline
                None => return Err(timed_out(job_id, started)),
            };

            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(now),
                None => Duration::MAX,
            };
            if remaining.is_zero() {
                // An error on the last attempt is reported as-is rather
                // than being disguised as a timeout.
                return Err(last_error.unwrap_or_else(|| timed_out(job_id, started)));
            }

            let delay = self.poll.delay_for_attempt(attempt).min(remaining);
            attempt = attempt.saturating_add(1);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Wait for result cancelled");
                    return Err(ResultError::Cancelled(job_id.clone()));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Non-blocking fetch of several results, in input order. Each entry
    /// carries its own condition.
    pub async fn get_many(&self, job_ids: &[JobId]) -> Vec<Result<serde_json::Value>> {
        join_all(job_ids.iter().map(|job_id| self.get(job_id, false, None))).await
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        self.store.ping().await
    }

    fn decode(&self, record: ResultRecord) -> Result<serde_json::Value> {
        let value = self
            .codec
            .decode(&record.payload)
            .map_err(|reason| ResultError::CorruptResult {
                job_id: record.job_id.clone(),
                reason,
            })?;

        match record.status {
            ResultStatus::Success => Ok(value),
            ResultStatus::Failure => {
                let failure: FailureDescriptor =
                    serde_json::from_value(value).map_err(|e| ResultError::CorruptResult {
                        job_id: record.job_id.clone(),
                        reason: format!("Invalid failure descriptor: {}", e),
                    })?;
                Err(ResultError::JobFailed {
                    job_id: record.job_id,
                    failure,
                })
            }
        }
    }
}

fn timed_out(job_id: &JobId, started: Instant) -> ResultError {
    let waited = started.elapsed();
    warn!(job_id = %job_id, waited_ms = waited.as_millis() as u64, "Timed out waiting for result");
    ResultError::ResultTimeout {
        job_id: job_id.clone(),
        waited,
    }
}
