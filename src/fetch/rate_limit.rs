//! Per-source token-bucket rate limiting.
//!
//! One bucket per data source, created lazily on first use and shared for
//! the life of the limiter. Sources without a configured budget are never
//! throttled, so new providers work without pre-registration.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Refill rate and burst size for one data source.
#[derive(Debug, Clone, Copy)]
pub struct RateBudget {
    /// Tokens added per second.
    pub tokens_per_second: f64,
    /// Maximum tokens the bucket can hold.
    pub burst: f64,
}

impl RateBudget {
    pub fn new(tokens_per_second: f64, burst: f64) -> Self {
        Self {
            tokens_per_second,
            burst,
        }
    }

    /// One request per `seconds` seconds, no bursting.
    pub fn per_seconds(seconds: f64) -> Self {
        Self::new(1.0 / seconds, 1.0)
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(budget: RateBudget) -> Self {
        Self {
            tokens: budget.burst,
            last_update: Instant::now(),
            rate: budget.tokens_per_second,
            capacity: budget.burst,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Token-bucket rate limiter keyed by data-source name.
///
/// Constructed once by the caller and shared across fetchers via `Arc`;
/// there is no process-global instance. Budgets are in-memory only and do
/// not persist across runs.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    budgets: HashMap<String, RateBudget>,
}

impl RateLimiter {
    /// A limiter with no budgets: every source is unlimited.
    ///
    /// This is the explicit test/bench policy; automated tests should use
    /// it instead of waiting out production budgets.
    pub fn unlimited() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            budgets: HashMap::new(),
        }
    }

    /// Conservative production budgets for the known sources.
    ///
    /// Etherscan allows a healthy request rate; AlphaVantage's free tier is
    /// 5 requests per minute, so one token every 12 seconds; Rentcast is
    /// generous.
    pub fn with_defaults() -> Self {
        Self::unlimited()
            .budget("etherscan", RateBudget::new(4.0, 1.0))
            .budget("alphavantage", RateBudget::per_seconds(12.0))
            .budget("rentcast", RateBudget::new(10.0, 1.0))
    }

    /// Set the budget for a source, replacing any existing bucket.
    pub fn budget(mut self, source: impl Into<String>, budget: RateBudget) -> Self {
        self.budgets.insert(source.into(), budget);
        self
    }

    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        // A poisoned lock only risks slightly off token accounting.
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("rate limiter bucket map was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until a token is available for `source`.
    ///
    /// Sources without a budget return immediately. The lock is only held
    /// for token accounting; the actual waiting happens in `sleep`, so this
    /// is a cancellation point for callers running under a deadline.
    pub async fn wait(&self, source: &str) {
        let Some(budget) = self.budgets.get(source) else {
            return;
        };

        loop {
            let wait_time = {
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(source.to_string())
                    .or_insert_with(|| TokenBucket::new(*budget));

                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            debug!(source, ?wait_time, "rate limiter waiting for token");
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Non-blocking probe: take a token if one is available right now.
    pub fn try_acquire(&self, source: &str) -> bool {
        let Some(budget) = self.budgets.get(source) else {
            return true;
        };

        let mut buckets = self.lock_buckets();
        buckets
            .entry(source.to_string())
            .or_insert_with(|| TokenBucket::new(*budget))
            .try_acquire()
    }
}
