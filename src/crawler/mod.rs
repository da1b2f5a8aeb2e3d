//! Crawler module for careers-site traversal
//!
//! This module contains the core crawling logic, including:
//! - Crawl parameters and their validation
//! - The crawl session that owns the browser and the visited set
//! - The page pipeline and depth-first traversal
//! - Per-page and per-crawl reports

mod orchestrator;
mod page;
mod report;
mod session;

pub use orchestrator::Orchestrator;
pub use page::{candidate_href, has_apply_signal, PageTracker};
pub use report::{CrawlReport, CrawlTask, PageOutcome, PageReport};
pub use session::CrawlSession;

use crate::config::CrawlerConfig;
use crate::extract::JobPosting;
use crate::{ConfigError, ScoutError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of levels explored below the start page
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Default number of accepted links followed per page
pub const DEFAULT_MAX_BREADTH: usize = 17;

/// Default page-load timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Parameters of a single crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlParams {
    pub start_url: String,
    /// Pages at this depth or deeper are not loaded
    pub max_depth: u32,
    /// Accepted links followed per page, in document order
    pub max_breadth: usize,
    pub headless: bool,
    pub timeout: Duration,
}

impl CrawlParams {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_breadth: DEFAULT_MAX_BREADTH,
            headless: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds parameters for `start_url` from the `[crawler]` section
    pub fn from_config(start_url: impl Into<String>, config: &CrawlerConfig) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: config.max_depth,
            max_breadth: config.max_breadth,
            headless: config.headless,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_breadth(mut self, max_breadth: usize) -> Self {
        self.max_breadth = max_breadth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rejects parameters that would make the crawl meaningless
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.max_depth < 1 {
            return Err(ConfigError::Validation("max-depth must be at least 1".to_string()).into());
        }
        if self.max_breadth < 1 {
            return Err(
                ConfigError::Validation("max-breadth must be at least 1".to_string()).into(),
            );
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Validation("timeout must be positive".to_string()).into());
        }
        Ok(())
    }
}

/// Crawls one careers site
///
/// Never fails: if the crawl cannot start (bad URL, no browser) the error is
/// logged and an empty report carrying the error is returned.
///
/// # Arguments
///
/// * `orchestrator` - Configured orchestrator
/// * `params` - Start URL and traversal limits
/// * `cancel` - Stops the crawl between page steps and during waits
pub async fn scrape_website(
    orchestrator: &Orchestrator,
    params: &CrawlParams,
    cancel: &CancellationToken,
) -> CrawlReport {
    match orchestrator.run(params, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Could not crawl {}: {}", params.start_url, e);
            CrawlReport::empty(params.start_url.clone(), Some(e.to_string()))
        }
    }
}

/// Crawls several sites one after another
///
/// Each site gets its own browser session and visited set; `template`
/// supplies everything but the start URL. Sites not yet started when `cancel`
/// fires are skipped.
pub async fn scrape_websites(
    orchestrator: &Orchestrator,
    urls: &[String],
    template: &CrawlParams,
    cancel: &CancellationToken,
) -> Vec<CrawlReport> {
    let mut reports = Vec::with_capacity(urls.len());

    for (i, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!("Skipping {} remaining sites", urls.len() - i);
            break;
        }
        tracing::info!("Site {}/{}: {}", i + 1, urls.len(), url);

        let params = CrawlParams {
            start_url: url.clone(),
            ..template.clone()
        };
        reports.push(scrape_website(orchestrator, &params, cancel).await);
    }

    reports
}

/// Concatenates the postings of several crawls, in crawl order
pub fn collect_postings(reports: &[CrawlReport]) -> Vec<JobPosting> {
    reports
        .iter()
        .flat_map(|report| report.postings.iter().cloned())
        .collect()
}
