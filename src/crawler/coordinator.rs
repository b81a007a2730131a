//! Crawler coordinator - main crawl orchestration logic
//!
//! The [`Crawler`] owns the transport and the rate limiter for its whole
//! lifetime, while the frontier and the result and error aggregates live for
//! exactly one [`Crawler::crawl`] call. A crawl proceeds as:
//! 1. Install fresh shared state (failing if a crawl is already in flight)
//! 2. Fetch robots.txt once and freeze the disallowed prefixes
//! 3. Return an empty report if the whole site is disallowed
//! 4. Spawn the worker pool and wait for every completion signal
//! 5. Join the worker tasks and assemble the report

use crate::config::Config;
use crate::crawler::job::CrawlJob;
use crate::crawler::progress::{CrawlProgress, CrawlReport, FetchFailure};
use crate::crawler::rate_limiter::RollingWindowRateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::state::CrawlState;
use crate::crawler::worker::{CrawlContext, ProgressCallback, Worker, WorkerSettings};
use crate::robots;
use crate::transport::{HttpTransport, Transport};
use crate::SumiError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;

type CurrentCrawl = Mutex<Option<Arc<CrawlState>>>;

/// Multi-worker crawl orchestrator
///
/// A crawler runs at most one crawl at a time. It is `Sync`, so a running
/// crawl can be observed and cancelled through a shared reference:
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use sumi_sweep::crawler::{CrawlJob, Crawler, RollingWindowRateLimiter};
/// use sumi_sweep::config::UserAgentConfig;
/// use sumi_sweep::transport::HttpTransport;
///
/// # async fn example() -> Result<(), sumi_sweep::SumiError> {
/// # let user_agent: UserAgentConfig = unimplemented!();
/// let transport = HttpTransport::new(&user_agent, Duration::from_secs(3))?;
/// let limiter = RollingWindowRateLimiter::new(10, Duration::from_secs(1));
/// let crawler = Crawler::new(Arc::new(transport), Arc::new(limiter));
///
/// let job = CrawlJob::builder("https://example.com/").workers(4).build()?;
/// let report = crawler.crawl(job).await?;
/// println!("{} pages crawled", report.crawl_count());
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RollingWindowRateLimiter>,
    settings: WorkerSettings,
    current: CurrentCrawl,
}

impl Crawler {
    /// Creates a crawler over `transport`, throttled by `rate_limiter`
    pub fn new(transport: Arc<dyn Transport>, rate_limiter: Arc<RollingWindowRateLimiter>) -> Self {
        Self {
            transport,
            rate_limiter,
            settings: WorkerSettings::default(),
            current: Mutex::new(None),
        }
    }

    /// Builds an HTTP-backed crawler from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Crawler with an `HttpTransport` and a rolling-window limiter
    /// * `Err(SumiError)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, SumiError> {
        let transport = HttpTransport::new(&config.user_agent, config.crawler.request_timeout())?;
        let limiter = RollingWindowRateLimiter::new(
            config.crawler.max_accesses_per_window,
            config.crawler.window(),
        );

        Ok(Self::new(Arc::new(transport), Arc::new(limiter)))
    }

    /// Has worker 0 pass a progress snapshot to `callback` at most once per
    /// `interval`
    pub fn with_progress<F>(mut self, interval: Duration, callback: F) -> Self
    where
        F: Fn(&CrawlProgress) + Send + Sync + 'static,
    {
        let callback: ProgressCallback = Arc::new(callback);
        self.settings.progress = Some((interval, callback));
        self
    }

    /// Replaces the retry policy applied when the frontier runs dry
    pub fn with_starvation_policy(mut self, policy: RetryPolicy) -> Self {
        self.settings.starvation = policy;
        self
    }

    /// Replaces the poll interval of the startup holding pattern
    pub fn with_holding_poll(mut self, poll: Duration) -> Self {
        self.settings.holding_poll = poll;
        self
    }

    /// Returns true while a crawl is in flight
    pub fn is_running(&self) -> bool {
        self.lock_current().is_some()
    }

    /// Snapshot of the running crawl, if any
    pub fn progress(&self) -> Option<CrawlProgress> {
        self.lock_current().as_ref().map(|state| state.progress())
    }

    /// Requests cooperative cancellation of the running crawl
    ///
    /// Workers stop at their next check point; in-flight fetches are allowed
    /// to finish. The pending [`Crawler::crawl`] call still returns a report.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Cancellation was signalled
    /// * `Err(SumiError::NotRunning)` - No crawl is in flight
    pub fn cancel(&self) -> Result<(), SumiError> {
        let current = self.lock_current();
        let state = current.as_ref().ok_or(SumiError::NotRunning)?;

        tracing::info!("Cancellation requested");
        state.cancel();
        Ok(())
    }

    /// Runs `job` to completion
    ///
    /// # Arguments
    ///
    /// * `job` - The validated crawl job
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl finished, was cancelled, or was
    ///   disallowed entirely by robots.txt
    /// * `Err(SumiError::AlreadyRunning)` - Another crawl is in flight
    /// * `Err(SumiError::Crawl)` - A worker task failed
    pub async fn crawl(&self, job: CrawlJob) -> Result<CrawlReport, SumiError> {
        let state = Arc::new(CrawlState::new(job.seeds()));
        {
            let mut current = self.lock_current();
            if current.is_some() {
                return Err(SumiError::AlreadyRunning);
            }
            *current = Some(Arc::clone(&state));
        }
        let mut running = RunningGuard {
            current: &self.current,
            state: Arc::clone(&state),
            workers: Vec::new(),
        };

        tracing::info!(
            "Starting crawl of {} with {} worker(s) and {} seed(s)",
            job.domain(),
            job.workers(),
            job.seeds().len()
        );

        let disallowed = self.disallowed_prefixes(&job, &state).await;
        if disallowed.iter().any(|prefix| prefix == "/") {
            tracing::info!("robots.txt disallows all of {}, nothing to crawl", job.domain());
            return Ok(state.empty_report());
        }
        if !disallowed.is_empty() {
            tracing::info!("robots.txt disallows {} prefix(es)", disallowed.len());
        }

        let workers = job.workers();
        let context = Arc::new(CrawlContext {
            job,
            state: Arc::clone(&state),
            transport: Arc::clone(&self.transport),
            rate_limiter: Arc::clone(&self.rate_limiter),
            disallowed,
            settings: self.settings.clone(),
        });

        let mut handles = Vec::with_capacity(workers);
        let mut signals = Vec::with_capacity(workers);
        for id in 0..workers {
            let (worker, done) = Worker::new(id);
            signals.push(done);
            let handle = tokio::spawn(worker.run(Arc::clone(&context)));
            running.workers.push(handle.abort_handle());
            handles.push(handle);
        }

        for (id, mut done) in signals.into_iter().enumerate() {
            if done.wait_for(|finished| *finished).await.is_err() {
                tracing::debug!("Worker {} dropped its completion signal", id);
            }
        }

        for (id, handle) in handles.into_iter().enumerate() {
            handle.await.map_err(|e| SumiError::Crawl {
                message: format!("worker {} did not finish cleanly", id),
                source: Box::new(e),
            })?;
        }

        let report = state.report();
        tracing::info!(
            "Crawl {}: {} pages crawled, {} results, {} errors in {:?}",
            if state.is_cancelled() { "cancelled" } else { "completed" },
            report.crawl_count(),
            report.results_count(),
            report.errors().len(),
            report.progress.elapsed
        );

        Ok(report)
    }

    /// Fetches robots.txt for the job's domain, failing open
    ///
    /// A transport failure is recorded as a crawl error and treated as "no
    /// restrictions".
    async fn disallowed_prefixes(&self, job: &CrawlJob, state: &CrawlState) -> Vec<String> {
        let authority = job.domain().authority();
        match robots::get_disallowed_prefixes(self.transport.as_ref(), &authority, job.cookies()).await {
            Ok(disallowed) => disallowed,
            Err(e) => {
                tracing::warn!("Could not fetch robots.txt for {}: {}", authority, e);
                state.record_failure(FetchFailure::new(
                    format!("http://{}/robots.txt", authority),
                    e.to_string(),
                ));
                Vec::new()
            }
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Arc<CrawlState>>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the running crawl on every exit path of [`Crawler::crawl`]
///
/// If the crawl future is dropped before the workers finish, the crawl is
/// stopped and every worker task is aborted so none outlives it.
struct RunningGuard<'a> {
    current: &'a CurrentCrawl,
    state: Arc<CrawlState>,
    workers: Vec<AbortHandle>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.state.stop();
        let unfinished = self.workers.iter().filter(|w| !w.is_finished()).count();
        if unfinished > 0 {
            tracing::warn!("Crawl abandoned, aborting {} worker(s)", unfinished);
            for worker in &self.workers {
                worker.abort();
            }
        }
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Runs a complete crawl described by a configuration file
///
/// Builds an HTTP-backed [`Crawler`] and the [`CrawlJob`] from `config`,
/// then crawls to completion.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed successfully
/// * `Err(SumiError)` - The job was invalid or the crawl failed
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::config::load_config;
/// use sumi_sweep::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(&config).await?;
/// println!("{} results", report.results_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlReport, SumiError> {
    let job = config.to_job()?;
    let crawler = Crawler::from_config(config)?;
    crawler.crawl(job).await
}
