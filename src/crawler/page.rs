//! Per-page helpers: candidate filtering, apply signals, phase tracking

use super::report::{CrawlTask, PageOutcome, PageReport};
use crate::browser::LinkCandidate;
use crate::state::{CrawlPhase, VisitedSet};
use crate::url::{is_same_site, strip_fragment};
use crate::ScoutError;
use std::collections::HashSet;
use url::Url;

/// Words in a link's text that mark the current page as a job-detail page
const APPLY_KEYWORDS: [&str; 2] = ["apply", "submit"];

/// True if a link with this text suggests the page is a job-detail page
pub fn has_apply_signal(link_text: &str) -> bool {
    let text = link_text.trim().to_lowercase();
    APPLY_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Returns the fragment-stripped href of `link` if it may be crawled
///
/// A candidate is http(s), on the crawl's site, not page chrome (`ignored`)
/// and not yet visited.
pub fn candidate_href(
    link: &LinkCandidate,
    site: &Url,
    ignored: &HashSet<String>,
    visited: &VisitedSet,
) -> Option<String> {
    let href = link.href.trim();
    if href.is_empty() {
        return None;
    }

    let clean = strip_fragment(href);
    let url = Url::parse(&clean).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if !is_same_site(&url, site) || ignored.contains(&clean) || visited.is_visited(&clean) {
        return None;
    }

    Some(clean)
}

/// Tracks one page step through its phases
#[derive(Debug)]
pub struct PageTracker {
    task: CrawlTask,
    phase: CrawlPhase,
    pub(crate) links_classified: usize,
    pub(crate) links_accepted: usize,
    pub(crate) postings: usize,
    pub(crate) apply_signal: bool,
    pub(crate) dead_end: bool,
}

impl PageTracker {
    pub fn new(task: CrawlTask) -> Self {
        Self {
            task,
            phase: CrawlPhase::Idle,
            links_classified: 0,
            links_accepted: 0,
            postings: 0,
            apply_signal: false,
            dead_end: false,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting transitions the state machine forbids
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), ScoutError> {
        if !self.phase.can_transition_to(next) {
            return Err(ScoutError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("{}: {} -> {}", self.task.url, self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Marks the page step as failed, from whatever phase it reached
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = CrawlPhase::Failed;
        }
    }

    /// Builds the page report
    pub fn into_report(self, outcome: PageOutcome) -> PageReport {
        PageReport {
            url: self.task.url,
            depth: self.task.depth,
            phase: self.phase,
            outcome,
            links_classified: self.links_classified,
            links_accepted: self.links_accepted,
            apply_signal: self.apply_signal,
        }
    }

    /// Outcome of a page step that finished without error
    pub fn success_outcome(&self, followed: usize) -> PageOutcome {
        if self.dead_end {
            PageOutcome::DeadEnd
        } else {
            PageOutcome::Explored {
                postings: self.postings,
                followed,
            }
        }
    }
}
