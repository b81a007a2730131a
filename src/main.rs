//! Sumi-Sweep main entry point
//!
//! This is the command-line interface for the Sumi-Sweep domain crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_sweep::config::{load_config_with_hash, CompletionSpec, Config, EnqueueSpec};
use sumi_sweep::crawler::{CrawlJob, CrawlReport, Crawler};
use sumi_sweep::output::{
    ConsoleOutputHandler, CrawlStatus, CrawlSummary, MarkdownOutputHandler, OutputHandler,
};
use tracing_subscriber::EnvFilter;

/// Sumi-Sweep: a bounded, polite, multi-worker crawler
///
/// Sumi-Sweep crawls a single domain with a pool of workers while respecting
/// robots.txt and a per-host rate limit, extracting links and any data
/// matched by a custom pattern.
#[derive(Parser, Debug)]
#[command(name = "sumi-sweep")]
#[command(version)]
#[command(about = "A bounded, polite, multi-worker crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let job = config.to_job().context("Invalid crawl job")?;

    if cli.dry_run {
        handle_dry_run(&config, &job);
        return Ok(());
    }

    handle_crawl(&config, job, &config_hash, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sweep=info,warn"),
            1 => EnvFilter::new("sumi_sweep=debug,info"),
            2 => EnvFilter::new("sumi_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, job: &CrawlJob) {
    println!("=== Sumi-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", job.workers());
    println!(
        "  Rate limit: {} requests per {}ms per host",
        config.crawler.max_accesses_per_window, config.crawler.window_ms
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());
    if let Some(proxy) = &config.user_agent.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nOutput:");
    println!("  Summary: {}", config.output.summary_path);

    println!("\nJob:");
    println!("  Domain: {}", job.domain());
    println!(
        "  Pattern: {}",
        job.pattern().map(|p| p.as_str()).unwrap_or("(links only)")
    );
    println!("  Follow links: {}", job.follow_links());
    println!("  Cookies: {}", job.cookies().len());

    println!("\nSeeds ({}):", job.seeds().len());
    for seed in job.seeds() {
        println!("  - {}", seed);
    }

    println!("\nCompletion Conditions ({}):", config.job.completion.len());
    for spec in &config.job.completion {
        match spec {
            CompletionSpec::MaxPages { limit } => println!("  - stop after {} pages", limit),
            CompletionSpec::MaxTime { seconds } => println!("  - stop after {}s", seconds),
            CompletionSpec::MaxResults { limit } => println!("  - stop after {} results", limit),
            CompletionSpec::MaxErrors { limit } => println!("  - stop after {} errors", limit),
        }
    }

    println!("\nEnqueue Conditions ({}):", config.job.enqueue.len());
    for spec in &config.job.enqueue {
        match spec {
            EnqueueSpec::IncludePattern { pattern } => println!("  - only URLs matching {}", pattern),
            EnqueueSpec::ExcludePattern { pattern } => println!("  - skip URLs matching {}", pattern),
            EnqueueSpec::MaxDepth { limit } => println!("  - path depth at most {}", limit),
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// Ctrl-C cancels the crawl; the partial report is still written.
async fn handle_crawl(config: &Config, job: CrawlJob, config_hash: &str, quiet: bool) -> Result<()> {
    let mut crawler = Crawler::from_config(config).context("Failed to build crawler")?;
    if let Some(interval) = config.crawler.progress_interval() {
        crawler = crawler.with_progress(interval, |progress| {
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {} results, {} errors, {:.2} pages/sec",
                progress.crawl_count,
                progress.queue_size,
                progress.results_count,
                progress.error_count(),
                progress.pages_per_second()
            );
        });
    }

    let domain = job.domain().to_string();
    let mut status = CrawlStatus::Completed;

    let crawl = crawler.crawl(job);
    tokio::pin!(crawl);

    let report: CrawlReport = tokio::select! {
        result = &mut crawl => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::warn!("Interrupted, cancelling crawl");
            status = CrawlStatus::Cancelled;
            crawler.cancel()?;
            crawl.await?
        }
    };

    let summary = CrawlSummary::from_report(&report, domain, status).with_config_hash(config_hash);

    MarkdownOutputHandler::new(Path::new(&config.output.summary_path))
        .write_summary(&summary)
        .with_context(|| format!("Failed to write report to {}", config.output.summary_path))?;

    if !quiet {
        ConsoleOutputHandler.write_summary(&summary)?;
    }

    Ok(())
}
