//! Crawler module for concurrent, bounded crawling
//!
//! This module contains the core crawling logic, including:
//! - Crawl jobs and their completion and enqueue conditions
//! - The shared, bounded frontier and visited set
//! - Per-host rolling-window rate limiting
//! - The worker loop and the orchestrating [`Crawler`]

mod conditions;
mod coordinator;
mod frontier;
mod job;
mod progress;
mod rate_limiter;
mod retry;
mod state;
mod worker;

pub use conditions::{
    all_enqueue_met, any_completion_met, CompletionCondition, EnqueueCondition,
    ExcludePatternCondition, IncludePatternCondition, MaxErrorsCondition,
    MaxPagesCrawledCondition, MaxPathDepthCondition, MaxResultsFoundCondition, MaxTimeCondition,
};
pub use coordinator::{run_crawl, Crawler};
pub use frontier::{Frontier, FRONTIER_CAPACITY};
pub use job::{CrawlJob, CrawlJobBuilder};
pub use progress::{CrawlProgress, CrawlReport, FetchFailure};
pub use rate_limiter::{RollingWindowRateLimiter, HOLD_QUANTUM};
pub use retry::{retry_then_fallback, RetryPolicy};
pub use worker::{ProgressCallback, HOLDING_POLL};
