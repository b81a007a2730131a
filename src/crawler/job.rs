//! Crawl job definition
//!
//! A [`CrawlJob`] is validated once by [`CrawlJobBuilder::build`] and is
//! immutable afterwards.

use crate::crawler::conditions::{CompletionCondition, EnqueueCondition};
use crate::transport::Cookie;
use crate::url::Domain;
use crate::SumiError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Everything a single crawl needs to know
#[derive(Clone)]
pub struct CrawlJob {
    domain: Domain,
    seeds: Vec<Url>,
    pattern: Option<Regex>,
    completion_conditions: Vec<Arc<dyn CompletionCondition>>,
    enqueue_conditions: Vec<Arc<dyn EnqueueCondition>>,
    workers: usize,
    follow_links: bool,
    cookies: Vec<Cookie>,
}

impl CrawlJob {
    /// Starts building a job confined to `domain`
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_sweep::crawler::{CrawlJob, MaxPagesCrawledCondition};
    ///
    /// let job = CrawlJob::builder("https://example.com/")
    ///     .seed("https://example.com/start")
    ///     .pattern(r#"<img.+?src="(?<image>.+?)""#)
    ///     .completion(MaxPagesCrawledCondition::new(100))
    ///     .workers(4)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(job.workers(), 4);
    /// ```
    pub fn builder(domain: impl Into<String>) -> CrawlJobBuilder {
        CrawlJobBuilder::new(domain)
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn seeds(&self) -> &[Url] {
        &self.seeds
    }

    /// The compiled custom pattern, present only when a non-empty pattern
    /// was supplied
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn completion_conditions(&self) -> &[Arc<dyn CompletionCondition>] {
        &self.completion_conditions
    }

    pub fn enqueue_conditions(&self) -> &[Arc<dyn EnqueueCondition>] {
        &self.enqueue_conditions
    }

    /// Worker count, always at least one
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn follow_links(&self) -> bool {
        self.follow_links
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

impl fmt::Debug for CrawlJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlJob")
            .field("domain", &self.domain.as_str())
            .field("seeds", &self.seeds.len())
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("completion_conditions", &self.completion_conditions.len())
            .field("enqueue_conditions", &self.enqueue_conditions.len())
            .field("workers", &self.workers)
            .field("follow_links", &self.follow_links)
            .field("cookies", &self.cookies.len())
            .finish()
    }
}

/// Builder for [`CrawlJob`]
pub struct CrawlJobBuilder {
    domain: String,
    seeds: Vec<String>,
    pattern: String,
    completion_conditions: Vec<Arc<dyn CompletionCondition>>,
    enqueue_conditions: Vec<Arc<dyn EnqueueCondition>>,
    workers: usize,
    follow_links: bool,
    cookies: Vec<Cookie>,
}

impl CrawlJobBuilder {
    fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            seeds: Vec::new(),
            pattern: String::new(),
            completion_conditions: Vec::new(),
            enqueue_conditions: Vec::new(),
            workers: 1,
            follow_links: true,
            cookies: Vec::new(),
        }
    }

    /// Adds a seed URL; it must start with the domain
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seeds.push(seed.into());
        self
    }

    /// Adds several seed URLs
    pub fn seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeds.extend(seeds.into_iter().map(Into::into));
        self
    }

    /// Sets the custom extraction pattern; empty means links only
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn completion(self, condition: impl CompletionCondition + 'static) -> Self {
        self.completion_arc(Arc::new(condition))
    }

    pub fn completion_arc(mut self, condition: Arc<dyn CompletionCondition>) -> Self {
        self.completion_conditions.push(condition);
        self
    }

    pub fn enqueue(self, condition: impl EnqueueCondition + 'static) -> Self {
        self.enqueue_arc(Arc::new(condition))
    }

    pub fn enqueue_arc(mut self, condition: Arc<dyn EnqueueCondition>) -> Self {
        self.enqueue_conditions.push(condition);
        self
    }

    /// Sets the worker allowance; values below one are clamped to one
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// Validates and freezes the job
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - The validated job
    /// * `Err(SumiError::SeedUriMismatch)` - A seed does not start with the domain
    /// * `Err(SumiError::InvalidPattern)` - The custom pattern does not compile
    /// * `Err(SumiError::InvalidArgument | UrlParse)` - The domain or a seed is malformed
    pub fn build(self) -> Result<CrawlJob, SumiError> {
        let domain = Domain::parse(&self.domain)?;

        let seeds = if self.seeds.is_empty() {
            vec![domain.url().clone()]
        } else {
            self.seeds
                .iter()
                .map(|seed| parse_seed(seed, &domain))
                .collect::<Result<Vec<_>, _>>()?
        };

        let pattern = if self.pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&self.pattern)?)
        };

        Ok(CrawlJob {
            domain,
            seeds,
            pattern,
            completion_conditions: self.completion_conditions,
            enqueue_conditions: self.enqueue_conditions,
            workers: self.workers.max(1),
            follow_links: self.follow_links,
            cookies: self.cookies,
        })
    }
}

fn parse_seed(seed: &str, domain: &Domain) -> Result<Url, SumiError> {
    let mismatch = || SumiError::SeedUriMismatch {
        seed: seed.to_string(),
        domain: domain.to_string(),
    };

    let url = Url::parse(seed.trim()).map_err(|_| mismatch())?;
    if !domain.contains(&url) {
        return Err(mismatch());
    }
    Ok(url)
}
