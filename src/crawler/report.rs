//! Per-page and per-crawl reports

use crate::extract::JobPosting;
use crate::state::CrawlPhase;
use crate::ErrorKind;
use chrono::{DateTime, Utc};

/// One unit of work on the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// How a page step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was processed; `postings` were extracted from it (and its
    /// iframes) and `followed` links were handed to the frontier
    Explored { postings: usize, followed: usize },

    /// No job links and no apply signal
    DeadEnd,

    /// The page step failed and its branch was dropped
    Abandoned(ErrorKind),

    /// The task was at or beyond the depth cap
    Skipped,
}

/// What happened on one page
#[derive(Debug, Clone)]
pub struct PageReport {
    pub url: String,
    pub depth: u32,
    /// Last phase the page step reached
    pub phase: CrawlPhase,
    pub outcome: PageOutcome,
    /// Links sent to the classifier
    pub links_classified: usize,
    /// Links the classifier accepted, before truncation
    pub links_accepted: usize,
    pub apply_signal: bool,
}

impl PageReport {
    pub fn skipped(task: &CrawlTask) -> Self {
        Self {
            url: task.url.clone(),
            depth: task.depth,
            phase: CrawlPhase::Idle,
            outcome: PageOutcome::Skipped,
            links_classified: 0,
            links_accepted: 0,
            apply_signal: false,
        }
    }
}

/// Result of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Postings in discovery order
    pub postings: Vec<JobPosting>,
    pub pages: Vec<PageReport>,
    /// Distinct URLs marked visited
    pub visited: usize,
    /// True if the crawl stopped because it was cancelled
    pub cancelled: bool,
    /// Why the crawl stopped early, if it did
    pub error: Option<String>,
}

impl CrawlReport {
    /// A report with no postings, for crawls that never started
    pub fn empty(start_url: impl Into<String>, error: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            start_url: start_url.into(),
            started_at: now,
            finished_at: now,
            postings: Vec::new(),
            pages: Vec::new(),
            visited: 0,
            cancelled: false,
            error,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Pages that were actually loaded
    pub fn pages_visited(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.outcome != PageOutcome::Skipped)
            .count()
    }
}
