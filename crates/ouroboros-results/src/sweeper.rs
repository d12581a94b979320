//! Periodic expiry sweep
//!
//! Reads already hide expired rows; the sweeper only reclaims space. It can
//! run in any number of processes at once since each pass deletes by
//! timestamp comparison.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::ResultStore;
use crate::Result;

/// Background task deleting expired results every `interval`.
pub struct Sweeper<S> {
    store: Arc<S>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<S: ResultStore> Sweeper<S> {
    pub fn new(store: Arc<S>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            shutdown: CancellationToken::new(),
        }
    }

    /// Run a single sweep pass now.
    pub async fn run_once(&self) -> Result<u64> {
        self.store.sweep(Utc::now()).await
    }

    /// Run until [`Sweeper::shutdown`] is called. The first pass happens
    /// immediately.
    pub async fn run(&self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Result sweeper started");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Result sweeper stopped");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(0) => tracing::trace!("Sweep found nothing to remove"),
                        Ok(removed) => tracing::info!(removed = removed, "Swept expired results"),
                        Err(e) => tracing::error!(error = %e, "Result sweep failed"),
                    }
                }
            }
        }
    }

    /// Spawn [`Sweeper::run`] onto the tokio runtime.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub fn shutdown(&self) {
        tracing::info!("Result sweeper shutdown requested");
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
