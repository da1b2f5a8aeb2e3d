/// Crawl phase definitions for tracking per-page progress
///
/// This module defines the states a single page step moves through.
use std::fmt;

/// Represents the phase of a page step in the crawl process
///
/// ```text
/// Idle -> FetchingPage -> EnumeratingLinks -> ClassifyingLinks
///      -> (ConvertingContent -> ExtractingJobs)? -> Recursing -> Done
/// ```
///
/// Any non-terminal phase may move to `Failed`. Iframes are handled inside
/// `FetchingPage`/`ClassifyingLinks`, which is why conversion can also start
/// from those phases and enumeration can resume after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active States =====
    /// Task popped, nothing done yet
    Idle,

    /// Navigating, waiting for readiness, triggering dynamic content
    FetchingPage,

    /// Reading links out of the document or a frame
    EnumeratingLinks,

    /// Asking the oracle about candidate links
    ClassifyingLinks,

    /// Converting a page or frame to text
    ConvertingContent,

    /// Turning converted text into job postings
    ExtractingJobs,

    /// Handing accepted links back to the frontier
    Recursing,

    // ===== Terminal States =====
    /// Page step finished
    Done,

    /// Page step was abandoned
    Failed,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    ///
    /// Staying in the same active phase is always allowed.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if self.is_terminal() {
            return false;
        }
        if *self == next || next == Failed {
            return true;
        }

        matches!(
            (self, next),
            (Idle, FetchingPage)
                | (Idle, Done)
                | (FetchingPage, EnumeratingLinks)
                | (FetchingPage, ConvertingContent)
                | (EnumeratingLinks, ClassifyingLinks)
                | (EnumeratingLinks, ConvertingContent)
                | (ClassifyingLinks, EnumeratingLinks)
                | (ClassifyingLinks, ConvertingContent)
                | (ClassifyingLinks, Recursing)
                | (ClassifyingLinks, Done)
                | (ConvertingContent, ExtractingJobs)
                | (ExtractingJobs, EnumeratingLinks)
                | (ExtractingJobs, ConvertingContent)
                | (ExtractingJobs, Recursing)
                | (ExtractingJobs, Done)
                | (Recursing, Done)
        )
    }

    /// Converts the phase to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingPage => "fetching_page",
            Self::EnumeratingLinks => "enumerating_links",
            Self::ClassifyingLinks => "classifying_links",
            Self::ConvertingContent => "converting_content",
            Self::ExtractingJobs => "extracting_jobs",
            Self::Recursing => "recursing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::FetchingPage,
            Self::EnumeratingLinks,
            Self::ClassifyingLinks,
            Self::ConvertingContent,
            Self::ExtractingJobs,
            Self::Recursing,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
