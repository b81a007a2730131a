//! Completion and enqueue conditions
//!
//! Completion conditions are predicates over a [`CrawlProgress`] snapshot;
//! the crawl ends as soon as any of them holds. Enqueue conditions are
//! predicates over a candidate URL; a discovered link enters the frontier
//! only if all of them hold. Both are stateless and side-effect free.

use crate::crawler::progress::CrawlProgress;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Predicate that ends the whole crawl when met
pub trait CompletionCondition: Send + Sync {
    fn condition_met(&self, progress: &CrawlProgress) -> bool;
}

/// Predicate that gates frontier admission of a discovered link
pub trait EnqueueCondition: Send + Sync {
    fn condition_met(&self, url: &Url) -> bool;
}

impl<F> EnqueueCondition for F
where
    F: Fn(&Url) -> bool + Send + Sync,
{
    fn condition_met(&self, url: &Url) -> bool {
        self(url)
    }
}

/// Returns true if any completion condition is met
pub fn any_completion_met(conditions: &[Arc<dyn CompletionCondition>], progress: &CrawlProgress) -> bool {
    conditions.iter().any(|c| c.condition_met(progress))
}

/// Returns true if every enqueue condition admits `url`
pub fn all_enqueue_met(conditions: &[Arc<dyn EnqueueCondition>], url: &Url) -> bool {
    conditions.iter().all(|c| c.condition_met(url))
}

/// Met once the crawl count reaches the limit
#[derive(Debug, Clone, Copy)]
pub struct MaxPagesCrawledCondition {
    max_pages: usize,
}

impl MaxPagesCrawledCondition {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }
}

impl CompletionCondition for MaxPagesCrawledCondition {
    fn condition_met(&self, progress: &CrawlProgress) -> bool {
        progress.crawl_count >= self.max_pages
    }
}

/// Met once the crawl has run for the given duration
#[derive(Debug, Clone, Copy)]
pub struct MaxTimeCondition {
    max_time: Duration,
}

impl MaxTimeCondition {
    pub fn new(max_time: Duration) -> Self {
        Self { max_time }
    }
}

impl CompletionCondition for MaxTimeCondition {
    fn condition_met(&self, progress: &CrawlProgress) -> bool {
        progress.elapsed >= self.max_time
    }
}

/// Met once enough (key, value) pairs have been extracted
#[derive(Debug, Clone, Copy)]
pub struct MaxResultsFoundCondition {
    max_results: usize,
}

impl MaxResultsFoundCondition {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl CompletionCondition for MaxResultsFoundCondition {
    fn condition_met(&self, progress: &CrawlProgress) -> bool {
        progress.results_count >= self.max_results
    }
}

/// Met once enough non-fatal errors have accumulated
#[derive(Debug, Clone, Copy)]
pub struct MaxErrorsCondition {
    max_errors: usize,
}

impl MaxErrorsCondition {
    pub fn new(max_errors: usize) -> Self {
        Self { max_errors }
    }
}

impl CompletionCondition for MaxErrorsCondition {
    fn condition_met(&self, progress: &CrawlProgress) -> bool {
        progress.error_count() >= self.max_errors
    }
}

/// Admits URLs whose string form matches the pattern
#[derive(Debug, Clone)]
pub struct IncludePatternCondition {
    pattern: Regex,
}

impl IncludePatternCondition {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl EnqueueCondition for IncludePatternCondition {
    fn condition_met(&self, url: &Url) -> bool {
        self.pattern.is_match(url.as_str())
    }
}

/// Rejects URLs whose string form matches the pattern
#[derive(Debug, Clone)]
pub struct ExcludePatternCondition {
    pattern: Regex,
}

impl ExcludePatternCondition {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl EnqueueCondition for ExcludePatternCondition {
    fn condition_met(&self, url: &Url) -> bool {
        !self.pattern.is_match(url.as_str())
    }
}

/// Admits URLs with at most `max_depth` non-empty path segments
#[derive(Debug, Clone, Copy)]
pub struct MaxPathDepthCondition {
    max_depth: usize,
}

impl MaxPathDepthCondition {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl EnqueueCondition for MaxPathDepthCondition {
    fn condition_met(&self, url: &Url) -> bool {
        let depth = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).count())
            .unwrap_or(0);
        depth <= self.max_depth
    }
}
