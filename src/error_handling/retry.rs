//! Retry policy for geolocation lookups.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use crate::config::{
    RETRY_FACTOR, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
};

/// An explicit retry-with-backoff policy.
///
/// Owned by the geolocation client and passed in as configuration rather
/// than buried in HTTP-layer defaults. `max_attempts` counts the initial
/// attempt, so a policy with `max_attempts = 3` issues at most two retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per lookup (initial attempt + retries).
    pub max_attempts: usize,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay on each subsequent retry.
    pub factor: u64,
    /// Upper bound on the delay between retries, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            factor: RETRY_FACTOR,
            max_delay_secs: RETRY_MAX_DELAY_SECS,
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt budget and default backoff schedule.
    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Builds the backoff iterator for `tokio_retry`.
    ///
    /// The iterator yields the delays between attempts, so it is truncated to
    /// `max_attempts - 1` entries.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(self.initial_delay_ms)
            .factor(self.factor)
            .max_delay(Duration::from_secs(self.max_delay_secs))
            .take(self.max_attempts.saturating_sub(1))
    }
}
