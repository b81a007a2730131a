//! Worker descriptor and the per-worker crawl loop
//!
//! Each worker is an independent tokio task that pulls URLs from the shared
//! frontier, fetches them through the transport, extracts links and data, and
//! feeds the results back into the shared aggregates. Workers coordinate only
//! through [`CrawlState`]: the frontier, the visited set, the result and error
//! collections, and the stop and cancellation flags.

use crate::crawler::conditions::any_completion_met;
use crate::crawler::job::CrawlJob;
use crate::crawler::progress::{CrawlProgress, FetchFailure};
use crate::crawler::rate_limiter::RollingWindowRateLimiter;
use crate::crawler::retry::{retry_then_fallback, RetryPolicy};
use crate::crawler::state::CrawlState;
use crate::extract::extract;
use crate::robots::uri_is_allowed;
use crate::transport::Transport;
use crate::url::extract_host;
use crate::SumiError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

/// Poll interval of the startup holding pattern
pub const HOLDING_POLL: Duration = Duration::from_millis(100);

/// Callback receiving periodic progress snapshots from worker 0
pub type ProgressCallback = Arc<dyn Fn(&CrawlProgress) + Send + Sync>;

/// Tunables shared by every worker of a crawler
#[derive(Clone)]
pub(crate) struct WorkerSettings {
    pub(crate) progress: Option<(Duration, ProgressCallback)>,
    pub(crate) starvation: RetryPolicy,
    pub(crate) holding_poll: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            progress: None,
            starvation: RetryPolicy::default(),
            holding_poll: HOLDING_POLL,
        }
    }
}

/// Everything a worker reads during one crawl
pub(crate) struct CrawlContext {
    pub(crate) job: CrawlJob,
    pub(crate) state: Arc<CrawlState>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) rate_limiter: Arc<RollingWindowRateLimiter>,
    pub(crate) disallowed: Vec<String>,
    pub(crate) settings: WorkerSettings,
}

/// One unit of crawl execution
///
/// Worker 0 starts immediately and is the only one that reports progress.
/// Worker `n > 0` holds until the frontier has at least `n + 1` URLs, or
/// until the crawl stops.
pub(crate) struct Worker {
    id: usize,
    done: watch::Sender<bool>,
}

impl Worker {
    /// Creates worker `id` and the receiver of its completion signal
    pub(crate) fn new(id: usize) -> (Self, watch::Receiver<bool>) {
        let (done, signal) = watch::channel(false);
        (Self { id, done }, signal)
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn is_primary(&self) -> bool {
        self.id == 0
    }

    /// Runs the worker to completion
    ///
    /// On exit, by any path including a panic, the global stop flag is
    /// raised and the completion signal is sent.
    pub(crate) async fn run(self, ctx: Arc<CrawlContext>) {
        let is_primary = self.is_primary();
        let Worker { id, done } = self;
        let _guard = CompletionGuard {
            state: &ctx.state,
            done,
        };

        if !is_primary {
            hold(&ctx, id).await;
        }

        tracing::debug!("Worker {} started", id);

        let mut last_progress = Instant::now();
        let mut fetched = 0usize;

        loop {
            if ctx.state.should_stop() {
                break;
            }

            let progress = ctx.state.progress();
            if any_completion_met(ctx.job.completion_conditions(), &progress) {
                tracing::info!(
                    "Worker {} observed a completion condition after {} pages",
                    id,
                    progress.crawl_count
                );
                break;
            }

            if is_primary {
                if let Some((interval, callback)) = &ctx.settings.progress {
                    if last_progress.elapsed() >= *interval {
                        callback(&progress);
                        last_progress = Instant::now();
                    }
                }
            }

            let Some(url) = next_url(&ctx, id).await else {
                break;
            };

            // A racing worker may have fetched it already
            if !ctx.state.frontier().mark_visited(&url) {
                tracing::trace!("Worker {} skipping already visited {}", id, url);
                continue;
            }

            process_url(&ctx, id, url).await;
            fetched += 1;
        }

        tracing::debug!("Worker {} finished after fetching {} pages", id, fetched);
    }
}

/// Raises the stop flag and signals completion when dropped
struct CompletionGuard<'a> {
    state: &'a CrawlState,
    done: watch::Sender<bool>,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.state.stop();
        self.done.send_replace(true);
    }
}

async fn hold(ctx: &CrawlContext, id: usize) {
    let started = Instant::now();
    while ctx.state.frontier().len() < id + 1 && !ctx.state.should_stop() {
        tokio::time::sleep(ctx.settings.holding_poll).await;
    }
    tracing::trace!("Worker {} released from holding after {:?}", id, started.elapsed());
}

/// Pops the next URL, retrying while the frontier is momentarily empty
///
/// Sustained emptiness raises the global stop flag.
async fn next_url(ctx: &CrawlContext, id: usize) -> Option<Url> {
    let state = &ctx.state;
    let policy = ctx.settings.starvation.with_abort_check(ctx.settings.holding_poll);
    retry_then_fallback(
        &policy,
        || state.frontier().try_dequeue(),
        || state.should_stop(),
        || {
            tracing::info!("Worker {} found the frontier exhausted, stopping crawl", id);
            state.stop();
        },
    )
    .await
}

/// Fetches one URL and folds the outcome into the shared aggregates
///
/// Failures are recorded and never propagated; they only feed the error
/// count.
async fn process_url(ctx: &CrawlContext, id: usize, url: Url) {
    let Some(host) = extract_host(&url) else {
        record_failure(ctx, id, &url, SumiError::InvalidArgument(format!("URL has no host: {}", url)));
        return;
    };

    if let Err(e) = ctx.rate_limiter.hold_until_ready(&host).await {
        record_failure(ctx, id, &url, e);
        return;
    }

    tracing::debug!("Worker {} fetching {}", id, url);
    let response = match ctx.transport.execute_request(&url, ctx.job.cookies()).await {
        Ok(response) => response,
        Err(e) => {
            record_failure(ctx, id, &url, e);
            return;
        }
    };

    if !response.is_success() {
        let error = SumiError::HttpStatus {
            url: url.to_string(),
            status: response.status_code,
        };
        record_failure(ctx, id, &url, error);
        return;
    }

    let extracted = extract(response.text(), ctx.job.domain(), ctx.job.pattern());

    if ctx.job.follow_links() {
        let found = extracted.links.len();
        let mut queued = 0usize;
        for link in extracted.links {
            if !uri_is_allowed(&ctx.disallowed, &link) {
                tracing::trace!("robots.txt disallows {}", link);
                continue;
            }
            if ctx.state.frontier().try_enqueue(link, ctx.job.enqueue_conditions()) {
                queued += 1;
            }
        }
        tracing::debug!("Worker {} queued {} of {} links from {}", id, queued, found, url);
    }

    ctx.state.append_results(extracted.data);
}

fn record_failure(ctx: &CrawlContext, id: usize, url: &Url, error: SumiError) {
    tracing::warn!("Worker {} failed on {}: {}", id, url, error);
    ctx.state
        .record_failure(FetchFailure::new(url.as_str(), error.to_string()));
}
