//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! [`CrawlSummary`] they render.

use crate::crawler::{CrawlReport, FetchFailure};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Completed,
    Cancelled,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStatus::Completed => "completed",
            CrawlStatus::Cancelled => "cancelled",
        }
    }
}

/// Summary of one crawl, ready for rendering
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub status: CrawlStatus,
    pub config_hash: Option<String>,

    // Overall statistics
    pub pages_crawled: usize,
    pub results_found: usize,
    pub queue_remaining: usize,

    // Failures and extracted data
    pub errors: Vec<FetchFailure>,
    pub data: Vec<(String, String)>,
}

impl CrawlSummary {
    /// Summarizes a finished crawl of `domain`
    pub fn from_report(report: &CrawlReport, domain: impl Into<String>, status: CrawlStatus) -> Self {
        Self {
            domain: domain.into(),
            started_at: report.progress.started_at,
            duration: report.progress.elapsed,
            status,
            config_hash: None,
            pages_crawled: report.crawl_count(),
            results_found: report.results_count(),
            queue_remaining: report.queue_size(),
            errors: report.errors().to_vec(),
            data: report.data.clone(),
        }
    }

    /// Attaches the fingerprint of the configuration that produced the crawl
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Returns the percentage of crawled pages that did not fail
    pub fn success_rate(&self) -> f64 {
        if self.pages_crawled == 0 {
            return 0.0;
        }
        let failed = self.errors.len().min(self.pages_crawled);
        ((self.pages_crawled - failed) as f64 / self.pages_crawled as f64) * 100.0
    }

    /// Returns the error rate as a percentage
    pub fn error_rate(&self) -> f64 {
        if self.pages_crawled == 0 {
            return 0.0;
        }
        (self.errors.len() as f64 / self.pages_crawled as f64) * 100.0
    }

    /// Returns the number of captured values per capture-group name, most
    /// frequent first
    pub fn results_by_key(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (key, _) in &self.data {
            *counts.entry(key.as_str()).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

/// Trait for output handlers
///
/// Output handlers persist or display a finished crawl's summary.
pub trait OutputHandler {
    /// Emits the summary
    ///
    /// # Arguments
    ///
    /// * `summary` - The summary of the finished crawl
    fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<()>;
}
