//! Crawl progress snapshots and the final crawl report

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A non-fatal, per-request failure recorded during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// The URL whose request failed
    pub url: String,

    /// Human-readable cause
    pub message: String,

    /// When the failure was recorded
    pub occurred_at: DateTime<Utc>,
}

impl FetchFailure {
    /// Creates a failure stamped with the current time
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Point-in-time view of a running crawl
///
/// Produced on demand from the live aggregates; never mutated after creation.
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// Time elapsed between the start and this snapshot
    pub elapsed: Duration,

    /// Number of URLs fetched (or attempted)
    pub crawl_count: usize,

    /// Number of extracted (key, value) pairs
    pub results_count: usize,

    /// Number of URLs waiting in the frontier
    pub queue_size: usize,

    /// Accumulated non-fatal errors
    pub errors: Vec<FetchFailure>,
}

impl CrawlProgress {
    /// Number of recorded non-fatal errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Fetch throughput over the elapsed time
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.crawl_count as f64 / secs
        } else {
            0.0
        }
    }
}

/// Terminal result of a crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Final progress figures
    pub progress: CrawlProgress,

    /// Every extracted (capture-group-name, value) pair, in no particular order
    pub data: Vec<(String, String)>,
}

impl CrawlReport {
    /// A report with nothing crawled, queued or found
    pub fn empty(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            progress: CrawlProgress {
                started_at,
                elapsed,
                crawl_count: 0,
                results_count: 0,
                queue_size: 0,
                errors: Vec::new(),
            },
            data: Vec::new(),
        }
    }

    pub fn crawl_count(&self) -> usize {
        self.progress.crawl_count
    }

    pub fn results_count(&self) -> usize {
        self.progress.results_count
    }

    pub fn queue_size(&self) -> usize {
        self.progress.queue_size
    }

    pub fn errors(&self) -> &[FetchFailure] {
        &self.progress.errors
    }
}
