//! ouroboros-results: PostgreSQL result backend for the ouroboros task queue
//!
//! Persists the outcome of a background job so that whoever enqueued it can
//! fetch it later, possibly from another process.
//!
//! - [`store`]: one row per job, upsert on write, expiry applied on read
//! - [`ResultGateway`]: outcome encoding and blocking polled reads
//! - [`ResultBackend`]: the two hooks a broker or worker calls
//! - [`Sweeper`]: background deletion of expired rows
//!
//! # Example
//! ```rust,ignore
//! use ouroboros_results::{BackendConfig, JobId, JobOutcome, ResultGateway};
//!
//! let config = BackendConfig::from_env()?;
//! let gateway = ResultGateway::connect(&config).await?;
//!
//! let job_id = JobId::new();
//! gateway.put(&job_id, &JobOutcome::success(serde_json::json!(42)), None).await?;
//! let value = gateway.get(&job_id, true, None).await?;
//! ```

pub mod error;
pub mod job;
pub mod outcome;
pub mod state;
pub mod codec;
pub mod poll;
pub mod identifier;
pub mod config;

pub mod store;
pub mod gateway;
pub mod backend;
pub mod sweeper;

// Re-exports
pub use error::{ResultError, Result};
pub use job::JobId;
pub use outcome::{FailureDescriptor, JobOutcome};
pub use state::{ResultRecord, ResultStatus};
pub use codec::{JsonCodec, ResultCodec};
pub use poll::PollPolicy;
pub use config::{BackendConfig, ConnectionParams, ConnectionSource, PoolConfig, RetryConfig};

pub use store::{MemoryStore, PostgresStore, ResultStore};
pub use gateway::ResultGateway;
pub use backend::ResultBackend;
pub use sweeper::Sweeper;
