//! Output module for generating crawl summaries and reports
//!
//! This module handles:
//! - Summarizing a [`CrawlReport`](crate::crawler::CrawlReport)
//! - Generating markdown reports
//! - Printing crawl statistics

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, write_markdown_report, MarkdownOutputHandler};
pub use stats::{print_statistics, ConsoleOutputHandler};
pub use traits::{CrawlStatus, CrawlSummary, OutputError, OutputHandler, OutputResult};
