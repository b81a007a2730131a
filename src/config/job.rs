//! Conversion of the `[job]` section into a [`CrawlJob`]

use crate::config::types::{CompletionSpec, Config, EnqueueSpec};
use crate::crawler::{
    CompletionCondition, CrawlJob, EnqueueCondition, ExcludePatternCondition,
    IncludePatternCondition, MaxErrorsCondition, MaxPagesCrawledCondition, MaxPathDepthCondition,
    MaxResultsFoundCondition, MaxTimeCondition,
};
use crate::SumiError;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

impl Config {
    /// Builds the validated crawl job described by this configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - The job, with `[crawler] workers` as its worker count
    /// * `Err(SumiError)` - A seed lies outside the domain or a pattern does
    ///   not compile
    pub fn to_job(&self) -> Result<CrawlJob, SumiError> {
        let job = &self.job;

        let mut builder = CrawlJob::builder(job.domain.as_str())
            .seeds(job.seeds.iter().cloned())
            .pattern(job.pattern.as_str())
            .workers(self.crawler.workers)
            .follow_links(job.follow_links)
            .cookies(job.cookies.iter().cloned());

        for spec in &job.completion {
            builder = builder.completion_arc(spec.to_condition());
        }
        for spec in &job.enqueue {
            builder = builder.enqueue_arc(spec.to_condition()?);
        }

        builder.build()
    }
}

impl CompletionSpec {
    pub fn to_condition(&self) -> Arc<dyn CompletionCondition> {
        match self {
            CompletionSpec::MaxPages { limit } => Arc::new(MaxPagesCrawledCondition::new(*limit)),
            CompletionSpec::MaxTime { seconds } => {
                Arc::new(MaxTimeCondition::new(Duration::from_secs(*seconds)))
            }
            CompletionSpec::MaxResults { limit } => Arc::new(MaxResultsFoundCondition::new(*limit)),
            CompletionSpec::MaxErrors { limit } => Arc::new(MaxErrorsCondition::new(*limit)),
        }
    }
}

impl EnqueueSpec {
    pub fn to_condition(&self) -> Result<Arc<dyn EnqueueCondition>, SumiError> {
        Ok(match self {
            EnqueueSpec::IncludePattern { pattern } => {
                Arc::new(IncludePatternCondition::new(Regex::new(pattern)?))
            }
            EnqueueSpec::ExcludePattern { pattern } => {
                Arc::new(ExcludePatternCondition::new(Regex::new(pattern)?))
            }
            EnqueueSpec::MaxDepth { limit } => Arc::new(MaxPathDepthCondition::new(*limit)),
        })
    }
}
