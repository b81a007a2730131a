//! Sumi-Sweep: a bounded, polite, multi-worker web crawler
//!
//! This crate crawls a single domain with a pool of concurrent workers,
//! extracting outbound links and user-specified data while respecting
//! robots.txt, a per-host rolling-window rate limit, and pluggable
//! completion policies.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod transport;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sweep operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed URL {seed} must start with the crawl domain {domain}")]
    SeedUriMismatch { seed: String, domain: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A crawl is already running on this crawler")]
    AlreadyRunning,

    #[error("No crawl is currently running")]
    NotRunning,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl failed: {message}")]
    Crawl {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Sweep operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlJob, CrawlProgress, CrawlReport, Crawler};
pub use extract::ExtractedData;
pub use transport::{HttpTransport, Transport};
