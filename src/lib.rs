//! Job-Scout: a careers-site crawler
//!
//! This crate drives a real browser through a company's careers site, asks a
//! text-completion oracle which links look like job postings, and turns the
//! pages that carry an "apply" signal into structured job-posting records.

pub mod browser;
pub mod config;
pub mod convert;
pub mod crawler;
pub mod extract;
pub mod oracle;
pub mod output;
pub mod retry;
pub mod state;
pub mod url;

use std::fmt;
use thiserror::Error;

pub use browser::BrowserError;
pub use convert::ConvertError;
pub use oracle::OracleError;
pub use output::OutputError;

/// Main error type for Job-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session could not be started: {0}")]
    SessionInit(#[source] BrowserError),

    #[error("Navigation to {url} failed: {source}")]
    Navigation { url: String, source: BrowserError },

    #[error("Page interaction failed: {0}")]
    Interaction(#[source] BrowserError),

    #[error("Browser error: {0}")]
    Browser(#[source] BrowserError),

    #[error("Classification of {href} failed: {source}")]
    Classification { href: String, source: OracleError },

    #[error("Conversion of {url} failed: {source}")]
    Conversion { url: String, source: ConvertError },

    #[error("Job extraction failed: {0}")]
    Extraction(#[source] OracleError),

    #[error("Extraction output could not be parsed: {0}")]
    ExtractionParse(#[from] serde_json::Error),

    #[error("Page step at {url} panicked: {message}")]
    PagePanic { url: String, message: String },

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Browser session was already released")]
    SessionReleased,

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the orchestrator does when a page step fails with a given error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Stop the whole crawl
    AbortCrawl,
    /// Give up on the current page and everything below it
    AbandonBranch,
    /// Accept a degraded result and keep going
    Degrade,
}

/// Coarse error kinds, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    SessionInit,
    Navigation,
    Interaction,
    Browser,
    Classification,
    Conversion,
    Extraction,
    ExtractionParse,
    Panic,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionInit => "session_init",
            Self::Navigation => "navigation",
            Self::Interaction => "interaction",
            Self::Browser => "browser",
            Self::Classification => "classification",
            Self::Conversion => "conversion",
            Self::Extraction => "extraction",
            Self::ExtractionParse => "extraction_parse",
            Self::Panic => "panic",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScoutError {
    /// Returns the coarse kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionInit(_) => ErrorKind::SessionInit,
            Self::Navigation { .. } => ErrorKind::Navigation,
            Self::Interaction(_) => ErrorKind::Interaction,
            Self::Browser(_) => ErrorKind::Browser,
            Self::Classification { .. } => ErrorKind::Classification,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::ExtractionParse(_) => ErrorKind::ExtractionParse,
            Self::PagePanic { .. } => ErrorKind::Panic,
            Self::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Internal,
        }
    }

    /// Decides how a failure of this kind is handled during a crawl
    ///
    /// | Kind | Disposition |
    /// |------|-------------|
    /// | SessionInit, Config, Cancelled, SessionReleased | abort the crawl |
    /// | Interaction, Classification, Conversion, Extraction, ExtractionParse | degrade |
    /// | everything else | abandon the branch |
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::SessionInit(_) | Self::Config(_) | Self::Cancelled | Self::SessionReleased => {
                Disposition::AbortCrawl
            }
            Self::Interaction(_)
            | Self::Classification { .. }
            | Self::Conversion { .. }
            | Self::Extraction(_)
            | Self::ExtractionParse(_) => Disposition::Degrade,
            _ => Disposition::AbandonBranch,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Job-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{scrape_website, scrape_websites, CrawlParams, CrawlReport, Orchestrator};
pub use extract::JobPosting;
pub use state::{CrawlPhase, VisitedSet};
pub use crate::url::{extract_domain, normalize_url, strip_fragment};
