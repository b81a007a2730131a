//! Per-host rolling-window rate limiting
//!
//! Each host keeps an append-only history of access timestamps. A request is
//! admitted when, after dropping entries older than the window, fewer than
//! `max_accesses_per_window` accesses remain. Waiting is a bounded poll with a
//! short fixed quantum rather than a blocking primitive; two workers racing in
//! the same tick may both be admitted, so the limit is soft.

use crate::SumiError;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Sleep between admission checks while a host is saturated
pub const HOLD_QUANTUM: Duration = Duration::from_millis(10);

/// Rolling-window rate limiter keyed by host
///
/// Designed to be wrapped in `Arc` and shared across worker tasks. The
/// `DashMap` shard lock is only held for the prune-and-append step, never
/// across an `.await`.
#[derive(Debug)]
pub struct RollingWindowRateLimiter {
    history: DashMap<String, Vec<Instant>>,
    max_accesses_per_window: usize,
    window: Duration,
}

impl RollingWindowRateLimiter {
    /// Creates a limiter admitting at most `max_accesses_per_window` requests
    /// per host within any trailing `window`
    ///
    /// A limit of zero is treated as one.
    pub fn new(max_accesses_per_window: usize, window: Duration) -> Self {
        Self {
            history: DashMap::new(),
            max_accesses_per_window: max_accesses_per_window.max(1),
            window,
        }
    }

    /// Returns the configured per-window limit
    pub fn max_accesses_per_window(&self) -> usize {
        self.max_accesses_per_window
    }

    /// Returns the configured window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until one more request to `host` fits in the window, then
    /// records it
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The access was recorded
    /// * `Err(SumiError::InvalidArgument)` - `host` is empty
    pub async fn hold_until_ready(&self, host: &str) -> Result<(), SumiError> {
        check_host(host)?;

        let started = Instant::now();
        while !self.try_admit(host) {
            tokio::time::sleep(HOLD_QUANTUM).await;
        }

        let waited = started.elapsed();
        if waited >= HOLD_QUANTUM {
            tracing::trace!("Rate limiter held {} for {:?}", host, waited);
        }

        Ok(())
    }

    /// Answers whether a request to `host` would be admitted now, without
    /// recording an access or waiting
    pub fn can_access(&self, host: &str) -> Result<bool, SumiError> {
        check_host(host)?;

        let Some(times) = self.history.get(host) else {
            return Ok(true);
        };

        let cutoff = self.cutoff(Instant::now());
        let recent = times.iter().filter(|t| !is_stale(**t, cutoff)).count();
        Ok(recent < self.max_accesses_per_window)
    }

    fn try_admit(&self, host: &str) -> bool {
        let now = Instant::now();
        let mut times = self.history.entry(host.to_string()).or_default();

        let cutoff = self.cutoff(now);
        times.retain(|t| !is_stale(*t, cutoff));

        if times.len() < self.max_accesses_per_window {
            times.push(now);
            true
        } else {
            false
        }
    }

    fn cutoff(&self, now: Instant) -> Option<Instant> {
        now.checked_sub(self.window)
    }
}

fn is_stale(time: Instant, cutoff: Option<Instant>) -> bool {
    cutoff.is_some_and(|cutoff| time < cutoff)
}

fn check_host(host: &str) -> Result<(), SumiError> {
    if host.is_empty() {
        return Err(SumiError::InvalidArgument(
            "host must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_access_is_immediate() {
        let limiter = RollingWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.hold_until_ready("example.com").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_empty_host_is_invalid() {
        let limiter = RollingWindowRateLimiter::new(1, Duration::from_secs(1));
        assert!(matches!(
            limiter.hold_until_ready("").await,
            Err(SumiError::InvalidArgument(_))
        ));
        assert!(matches!(
            limiter.can_access(""),
            Err(SumiError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_can_access_does_not_record() {
        let limiter = RollingWindowRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.can_access("example.com").unwrap());
        assert!(limiter.can_access("example.com").unwrap());

        limiter.hold_until_ready("example.com").await.unwrap();
        assert!(!limiter.can_access("example.com").unwrap());
    }

    #[tokio::test]
    async fn test_extra_access_blocks_until_oldest_ages_out() {
        let window = Duration::from_millis(300);
        let limiter = RollingWindowRateLimiter::new(3, window);

        let start = Instant::now();
        for _ in 0..3 {
            limiter.hold_until_ready("example.com").await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(100));

        limiter.hold_until_ready("example.com").await.unwrap();
        assert!(start.elapsed() >= window);
    }

    #[tokio::test]
    async fn test_hosts_are_independent() {
        let limiter = RollingWindowRateLimiter::new(1, Duration::from_secs(60));
        limiter.hold_until_ready("a.example.com").await.unwrap();

        let start = Instant::now();
        limiter.hold_until_ready("b.example.com").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
        assert!(!limiter.can_access("a.example.com").unwrap());
        assert!(limiter.can_access("c.example.com").unwrap());
    }

    #[tokio::test]
    async fn test_zero_limit_treated_as_one() {
        let limiter = RollingWindowRateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.max_accesses_per_window(), 1);
        limiter.hold_until_ready("example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let window = Duration::from_millis(200);
        let limiter = Arc::new(RollingWindowRateLimiter::new(2, window));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.hold_until_ready("example.com").await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Four accesses at two per window need at least one full window
        assert!(start.elapsed() >= window);
    }
}
