//! Console statistics for a finished crawl

use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_statistics(summary: &CrawlSummary) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Domain: {}", summary.domain);
    println!("  Status: {}", summary.status.as_str());
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
    println!("  Pages crawled: {}", summary.pages_crawled);
    println!("  Results found: {}", summary.results_found);
    println!("  Left in frontier: {}", summary.queue_remaining);
    println!();

    let by_key = summary.results_by_key();
    if !by_key.is_empty() {
        println!("Results by Capture Group:");
        for (key, count) in by_key {
            let percentage = if summary.results_found > 0 {
                (count as f64 / summary.results_found as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", key, count, percentage);
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("Errors ({}):", summary.errors.len());
        for error in summary.errors.iter().take(10) {
            println!("  - {}: {}", error.url, error.message);
        }
        if summary.errors.len() > 10 {
            println!("  ... and {} more", summary.errors.len() - 10);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} errors / {} pages)",
        summary.success_rate(),
        summary.errors.len(),
        summary.pages_crawled
    );
}

/// Output handler printing statistics to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutputHandler;

impl OutputHandler for ConsoleOutputHandler {
    fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<()> {
        print_statistics(summary);
        Ok(())
    }
}
