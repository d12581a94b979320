//! Polling policy for blocking result reads

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floor applied to every poll delay, whatever the policy says.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Backoff schedule used while waiting for a result to appear.
///
/// Delays grow geometrically from `initial_interval` and are capped at
/// `max_interval`, so a long wait costs at most one query per `max_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay after the first empty read
    pub initial_interval: Duration,
    /// Upper bound on the delay between reads
    pub max_interval: Duration,
    /// Growth factor per attempt (1.0 = fixed interval)
    pub multiplier: f64,
    /// Consecutive transient store errors absorbed before giving up
    pub transient_error_budget: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(500),
            multiplier: 2.0,
            transient_error_budget: 3,
        }
    }
}

impl PollPolicy {
    /// Poll at a fixed interval
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            ..Default::default()
        }
    }

    /// Capped exponential backoff
    pub fn exponential(initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            multiplier: 2.0,
            ..Default::default()
        }
    }

    pub fn with_transient_error_budget(mut self, budget: u32) -> Self {
        self.transient_error_budget = budget;
        self
    }

    /// Delay before the next read, given how many reads came back empty
    /// (0-indexed). Never below [`MIN_POLL_INTERVAL`].
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.raw_delay_for_attempt(attempt).max(MIN_POLL_INTERVAL)
    }

    fn raw_delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial_nanos = self.initial_interval.as_nanos() as f64;
        let max_nanos = self.max_interval.as_nanos() as f64;
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_nanos = (initial_nanos * self.multiplier.powi(exponent)).min(max_nanos);

        if delay_nanos.is_finite() && delay_nanos >= 0.0 {
            Duration::from_nanos(delay_nanos.round() as u64)
        } else {
            self.max_interval
        }
    }
}
