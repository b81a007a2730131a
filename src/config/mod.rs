//! Configuration module for Sumi-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turning the `[job]` section into a [`CrawlJob`](crate::crawler::CrawlJob).
//!
//! # Example
//!
//! ```no_run
//! use sumi_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod job;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CompletionSpec, Config, CrawlerConfig, EnqueueSpec, JobConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
