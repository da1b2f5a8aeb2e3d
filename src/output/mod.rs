//! Output module for postings and crawl reports
//!
//! This module handles:
//! - Writing postings as CSV or JSON lines
//! - Generating markdown reports of crawl results
//! - Computing and printing crawl statistics

mod csv_export;
mod markdown;
pub mod stats;

pub use csv_export::{write_postings_csv, write_postings_jsonl, write_postings_to};
pub use markdown::{format_markdown_report, write_markdown_report};
pub use stats::{print_statistics, CrawlStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
