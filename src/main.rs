//! Job-Scout main entry point
//!
//! This is the command-line interface for the Job-Scout careers-site crawler.

use anyhow::{bail, Context};
use clap::Parser;
use job_scout::config::{load_config_or_default, load_config_with_hash, validate, Config};
use job_scout::crawler::{collect_postings, scrape_websites, CrawlParams, Orchestrator};
use job_scout::output::{
    print_statistics, write_markdown_report, write_postings_csv, write_postings_jsonl,
    CrawlStatistics,
};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Job-Scout: a careers-site job crawler
///
/// Job-Scout drives a browser through a company's careers pages, follows the
/// links a language model recognises as job links, and extracts structured
/// postings from pages that offer an application.
#[derive(Parser, Debug)]
#[command(name = "job-scout")]
#[command(version = "1.0.0")]
#[command(about = "A careers-site job crawler", long_about = None)]
struct Cli {
    /// Careers pages to crawl, in addition to the configured seeds
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Levels explored below each start page
    #[arg(long)]
    max_depth: Option<u32>,

    /// Job links followed per page
    #[arg(long)]
    max_breadth: Option<usize>,

    /// Page load timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Write postings as CSV instead of JSON lines on stdout
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write a markdown crawl report
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

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
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line overrides")?;

    let urls = start_urls(&cli, &config);

    if cli.dry_run {
        handle_dry_run(&config, &urls)?;
        return Ok(());
    }

    if urls.is_empty() {
        bail!("no URLs to crawl: pass at least one URL or configure crawler.seeds");
    }

    handle_crawl(config, urls, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries postings.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_scout=info,warn"),
            1 => EnvFilter::new("job_scout=debug,info"),
            2 => EnvFilter::new("job_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => Ok(load_config_or_default(None)?),
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(breadth) = cli.max_breadth {
        config.crawler.max_breadth = breadth;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.timeout_secs = timeout;
    }
    if cli.headed {
        config.crawler.headless = false;
    }
    if let Some(csv) = &cli.csv {
        config.output.csv_path = Some(csv.display().to_string());
    }
    if let Some(report) = &cli.report {
        config.output.report_path = Some(report.display().to_string());
    }
}

/// Command-line URLs first, then configured seeds, without duplicates
fn start_urls(cli: &Cli, config: &Config) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in cli.urls.iter().chain(config.crawler.seeds.iter()) {
        if !urls.contains(url) {
            urls.push(url.clone());
        }
    }
    urls
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    println!("=== Job-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max breadth: {}", config.crawler.max_breadth);
    println!("  Page timeout: {}s", config.crawler.timeout_secs);
    println!("  Headless: {}", config.crawler.headless);

    println!("\nOracle:");
    println!("  Endpoint: {}", config.oracle.api_base_url);
    println!("  Model: {}", config.oracle.model);
    match config.oracle.api_key() {
        Ok(_) => println!("  API key: set ({})", config.oracle.api_key_env),
        Err(_) => println!("  API key: MISSING ({})", config.oracle.api_key_env),
    }

    println!("\nConverter:");
    println!("  Endpoint: {}", config.converter.endpoint);
    println!("  Chunk size: {} chars", config.converter.chunk_size);

    println!("\nOutput:");
    match &config.output.csv_path {
        Some(path) => println!("  Postings: {} (CSV)", path),
        None => println!("  Postings: stdout (JSON lines)"),
    }
    if let Some(path) = &config.output.report_path {
        println!("  Report: {}", path);
    }

    println!("\nStart URLs ({}):", urls.len());
    for url in urls {
        println!("  - {}", url);
    }

    println!("\nEffective configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);

    println!("✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, urls: Vec<String>, cli: &Cli) -> anyhow::Result<()> {
    let template = CrawlParams::from_config(String::new(), &config.crawler);
    let csv_path = config.output.csv_path.clone();
    let report_path = config.output.report_path.clone();

    let orchestrator = Orchestrator::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing the current page and shutting down");
            on_interrupt.cancel();
        }
    });

    tracing::info!("Crawling {} sites", urls.len());
    let reports = scrape_websites(&orchestrator, &urls, &template, &cancel).await;
    let postings = collect_postings(&reports);

    match &csv_path {
        Some(path) => write_postings_csv(&postings, Path::new(path))?,
        None => write_postings_jsonl(&postings, std::io::stdout().lock())?,
    }
    if let Some(path) = &report_path {
        write_markdown_report(&reports, Path::new(path))?;
    }

    if !cli.quiet {
        print_statistics(&CrawlStatistics::from_reports(&reports));
    }

    if !reports.is_empty() && reports.iter().all(|report| report.error.is_some()) {
        bail!("no site could be crawled");
    }
    Ok(())
}
