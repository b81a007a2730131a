//! Shared aggregates of one crawl invocation
//!
//! Created at the start of [`Crawler::crawl`](super::Crawler::crawl) and
//! dropped when it returns. Workers only ever append or flip a flag; every
//! operation here is a single atomic step.

use crate::crawler::frontier::{Frontier, FRONTIER_CAPACITY};
use crate::crawler::progress::{CrawlProgress, CrawlReport, FetchFailure};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use url::Url;

#[derive(Debug)]
pub(crate) struct CrawlState {
    started: Instant,
    started_at: DateTime<Utc>,
    frontier: Frontier,
    results: Mutex<Vec<(String, String)>>,
    errors: Mutex<Vec<FetchFailure>>,
    stop: AtomicBool,
    cancelled: AtomicBool,
}

impl CrawlState {
    pub(crate) fn new(seeds: &[Url]) -> Self {
        Self::with_capacity(seeds, FRONTIER_CAPACITY)
    }

    pub(crate) fn with_capacity(seeds: &[Url], capacity: usize) -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            frontier: Frontier::with_seeds(seeds, capacity),
            results: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    pub(crate) fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Raises the global stop signal; never unset within one crawl
    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once either the stop signal or cancellation is raised
    pub(crate) fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.is_cancelled()
    }

    pub(crate) fn record_failure(&self, failure: FetchFailure) {
        lock(&self.errors).push(failure);
    }

    pub(crate) fn append_results(&self, data: Vec<(String, String)>) {
        if !data.is_empty() {
            lock(&self.results).extend(data);
        }
    }

    /// Snapshot of the live aggregates
    pub(crate) fn progress(&self) -> CrawlProgress {
        CrawlProgress {
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
            crawl_count: self.frontier.visited_count(),
            results_count: lock(&self.results).len(),
            queue_size: self.frontier.len(),
            errors: lock(&self.errors).clone(),
        }
    }

    pub(crate) fn report(&self) -> CrawlReport {
        CrawlReport {
            progress: self.progress(),
            data: lock(&self.results).clone(),
        }
    }

    /// Report for a crawl that ended before any worker started
    pub(crate) fn empty_report(&self) -> CrawlReport {
        CrawlReport::empty(self.started_at, self.started.elapsed())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
