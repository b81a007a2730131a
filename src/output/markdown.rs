//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, error reports, and the extracted data.

use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum number of errors listed individually
const MAX_LISTED_ERRORS: usize = 50;

/// Maximum number of extracted pairs listed individually
const MAX_LISTED_RESULTS: usize = 200;

/// Writes a markdown summary file
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_report(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Sumi-Sweep Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Domain**: {}\n", summary.domain));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration.as_secs_f64()
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status.as_str()));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", summary.pages_crawled));
    md.push_str(&format!("- **Results Found**: {}\n", summary.results_found));
    md.push_str(&format!(
        "- **Left in Frontier**: {}\n",
        summary.queue_remaining
    ));
    md.push_str(&format!("- **Total Errors**: {}\n", summary.errors.len()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Error Rate**: {:.2}%\n\n",
        summary.error_rate()
    ));

    // Results per capture group
    let by_key = summary.results_by_key();
    if !by_key.is_empty() {
        md.push_str("## Results by Capture Group\n\n");
        md.push_str("| Group | Count |\n");
        md.push_str("|-------|-------|\n");
        for (key, count) in &by_key {
            md.push_str(&format!("| {} | {} |\n", key, count));
        }
        md.push('\n');
    }

    // Extracted data
    if !summary.data.is_empty() {
        md.push_str("## Extracted Data\n\n");
        md.push_str("| Group | Value |\n");
        md.push_str("|-------|-------|\n");
        for (key, value) in summary.data.iter().take(MAX_LISTED_RESULTS) {
            md.push_str(&format!("| {} | {} |\n", key, escape_cell(value)));
        }
        if summary.data.len() > MAX_LISTED_RESULTS {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.data.len() - MAX_LISTED_RESULTS
            ));
        }
        md.push('\n');
    }

    // Errors
    if !summary.errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| URL | Error | Time |\n");
        md.push_str("|-----|-------|------|\n");
        for error in summary.errors.iter().take(MAX_LISTED_ERRORS) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                error.url,
                escape_cell(&error.message),
                error.occurred_at.format("%H:%M:%S")
            ));
        }
        if summary.errors.len() > MAX_LISTED_ERRORS {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.errors.len() - MAX_LISTED_ERRORS
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps captured values from breaking the table layout
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Output handler writing the markdown report to a fixed path
#[derive(Debug, Clone)]
pub struct MarkdownOutputHandler {
    path: PathBuf,
}

impl MarkdownOutputHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for MarkdownOutputHandler {
    fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<()> {
        write_markdown_report(summary, &self.path)?;
        tracing::info!("Report written to {}", self.path.display());
        Ok(())
    }
}
