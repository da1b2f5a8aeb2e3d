//! State module for tracking crawl progress
//!
//! This module provides the per-crawl bookkeeping used by the orchestrator.
//!
//! # Components
//!
//! - `VisitedSet`: fragment-normalized URLs already enqueued in this crawl
//! - `CrawlPhase`: the per-page state machine (fetching, enumerating, classifying, ...)

mod phase;
mod visited;

// Re-export main types
pub use phase::CrawlPhase;
pub use visited::VisitedSet;
