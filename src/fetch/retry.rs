//! Bounded retry with exponential backoff.
//!
//! The retry decision is deliberately separate from error classification:
//! 408 is worth another attempt while the request is in flight, but once
//! attempts are exhausted it still surfaces as a client error.

use std::time::Duration;

/// Retry policy applied around every outbound HTTP call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Cap on the backoff between any two attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
        }
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based), doubling each time
    /// and capped at `max_backoff`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        exp.min(self.max_backoff)
    }

    /// Whether a request outcome warrants another attempt.
    ///
    /// Pure function of transport-error presence and status code: any
    /// transport failure, 5xx, 429, and 408 are retried; every other status
    /// is not.
    pub fn should_retry(transport_error: bool, status: Option<u16>) -> bool {
        if transport_error {
            return true;
        }
        match status {
            Some(s) if s >= 500 => true,
            Some(429) | Some(408) => true,
            _ => false,
        }
    }
}
