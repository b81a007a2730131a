//! Bounded retry with linear backoff, then fallback
//!
//! Used when a worker finds the frontier momentarily empty: other workers may
//! still be enqueueing, so emptiness is only treated as permanent after
//! sustained absence.

use std::time::Duration;

const DEFAULT_ABORT_CHECK: Duration = Duration::from_millis(100);

/// Retry ceiling and backoff step for frontier starvation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Retry `n` waits `n * backoff_step`
    pub backoff_step: Duration,

    /// Longest stretch of a backoff sleep without re-checking for abort
    pub abort_check: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_step: Duration) -> Self {
        Self {
            max_retries,
            backoff_step,
            abort_check: DEFAULT_ABORT_CHECK,
        }
    }

    /// Sets how often a backoff sleep looks at the abort signal
    pub fn with_abort_check(mut self, abort_check: Duration) -> Self {
        self.abort_check = abort_check;
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Sum of every backoff delay
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries).map(|n| self.backoff(n)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(200))
    }
}

/// Runs `attempt` until it yields a value, sleeping `n * step` before retry
/// `n`
///
/// If every retry comes back empty, `fallback` runs once and `None` is
/// returned. `abort` is checked before each retry and at least every
/// `policy.abort_check` while sleeping; when it reports true the loop gives
/// up without running the fallback.
pub async fn retry_then_fallback<T, A, S, F>(
    policy: &RetryPolicy,
    mut attempt: A,
    abort: S,
    fallback: F,
) -> Option<T>
where
    A: FnMut() -> Option<T>,
    S: Fn() -> bool,
    F: FnOnce(),
{
    if let Some(value) = attempt() {
        return Some(value);
    }

    for n in 1..=policy.max_retries {
        if !sleep_unless(policy.backoff(n), policy.abort_check, &abort).await {
            return None;
        }

        if let Some(value) = attempt() {
            return Some(value);
        }
    }

    fallback();
    None
}

/// Sleeps for `duration` in slices of at most `slice`
///
/// Returns false as soon as `abort` reports true, including before the first
/// slice.
async fn sleep_unless<S>(duration: Duration, slice: Duration, abort: &S) -> bool
where
    S: Fn() -> bool,
{
    let slice = slice.max(Duration::from_millis(1));
    let mut remaining = duration;
    loop {
        if abort() {
            return false;
        }
        if remaining.is_zero() {
            return true;
        }
        let step = remaining.min(slice);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}
