use crate::transport::Cookie;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub job: JobConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum requests per host within one rolling window
    pub max_accesses_per_window: usize,

    /// Length of the rolling window (milliseconds)
    pub window_ms: u64,

    /// Per-request deadline (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Interval between progress log lines (milliseconds, 0 disables)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl CrawlerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Progress interval, or `None` when progress reporting is off
    pub fn progress_interval(&self) -> Option<Duration> {
        (self.progress_interval_ms > 0).then(|| Duration::from_millis(self.progress_interval_ms))
    }
}

fn default_workers() -> usize {
    1
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_progress_interval_ms() -> u64 {
    5000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also matched against robots.txt user agents
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Optional outbound proxy URL
    #[serde(default)]
    pub proxy: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// e.g. `SumiSweep/0.1 (+https://example.com/about; admin@example.com)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown report file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// The crawl job to run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobConfig {
    /// Domain the crawl is confined to (e.g. "https://example.com/")
    pub domain: String,

    /// Seed URLs; the domain itself when empty
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Custom extraction pattern with named capture groups
    #[serde(default)]
    pub pattern: String,

    /// Whether discovered links are queued
    #[serde(default = "default_follow_links")]
    pub follow_links: bool,

    #[serde(default)]
    pub completion: Vec<CompletionSpec>,

    #[serde(default)]
    pub enqueue: Vec<EnqueueSpec>,

    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

fn default_follow_links() -> bool {
    true
}

/// A completion condition entry (`[[job.completion]]`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CompletionSpec {
    MaxPages { limit: usize },
    MaxTime { seconds: u64 },
    MaxResults { limit: usize },
    MaxErrors { limit: usize },
}

/// An enqueue condition entry (`[[job.enqueue]]`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EnqueueSpec {
    IncludePattern { pattern: String },
    ExcludePattern { pattern: String },
    MaxDepth { limit: usize },
}
