//! Browser session module
//!
//! A crawl owns exactly one browser session for its whole lifetime. This
//! module defines the capability surface the crawler needs from a browser
//! (`BrowserSession`), a way to start one (`BrowserLauncher`), a chromiumoxide
//! backed implementation, and the higher-level controller operations built on
//! top of the trait (readiness wait, scroll-to-load, random clicks, link
//! enumeration by zone, iframe traversal).

mod chromium;
mod controller;
pub mod scripts;

pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use controller::{
    frame_links, load_page, page_links, random_clicks, scroll_to_load, trigger_dynamic_content,
    wait_until_ready, InteractionReport,
};

use crate::url::strip_fragment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser session
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out loading {url} after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Frame {0} is not accessible")]
    FrameUnavailable(usize),

    #[error("Click at ({x}, {y}) was intercepted")]
    ClickIntercepted { x: u32, y: u32 },

    #[error("Browser session is closed")]
    Closed,

    #[error("DevTools protocol error: {0}")]
    Cdp(String),
}

impl BrowserError {
    /// Returns true if retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Navigation(_) | Self::Timeout { .. } | Self::Cdp(_)
        )
    }
}

/// Options used to start a browser
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub ignore_certificate_errors: bool,
    /// Extra command-line flags (stability flags and the like)
    pub args: Vec<String>,
    pub user_agent: String,
    /// Navigation timeout
    pub timeout: Duration,
    /// Explicit browser executable; auto-detected when `None`
    pub executable: Option<String>,
}

/// Structural region of a page that links are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkZone {
    Document,
    Header,
    Footer,
    Nav,
}

impl LinkZone {
    /// CSS selector matching the anchors of this zone
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Document => "a",
            Self::Header => "header a",
            Self::Footer => "footer a",
            Self::Nav => "nav a",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Nav => "nav",
        }
    }
}

/// `document.readyState` of the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Parses the DOM string form; unknown values count as still loading
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "complete" => Self::Complete,
            "interactive" => Self::Interactive,
            _ => Self::Loading,
        }
    }

    /// True once the document body is available
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// An anchor as seen by the browser
///
/// `href` is the resolved (absolute) URL, or empty if the anchor has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub href: String,
}

impl LinkCandidate {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// An iframe in the top-level document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    /// Position among the document's iframes
    pub index: usize,
    /// Resolved `src`, empty when the frame has none
    #[serde(default)]
    pub src: String,
}

/// Result of a click attempt that was not intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    NoTarget,
}

/// Snapshot of a page's links, partitioned into zones
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub document: Vec<LinkCandidate>,
    pub header: Vec<LinkCandidate>,
    pub footer: Vec<LinkCandidate>,
    pub nav: Vec<LinkCandidate>,
}

impl PageLinks {
    /// Returns the fragment-stripped hrefs of header, footer and nav links
    ///
    /// These are page chrome, so they are never crawl candidates.
    pub fn ignored_hrefs(&self) -> HashSet<String> {
        self.header
            .iter()
            .chain(&self.footer)
            .chain(&self.nav)
            .filter(|link| !link.href.is_empty())
            .map(|link| strip_fragment(&link.href))
            .collect()
    }
}

/// Capability surface of one browser automation session
///
/// Methods take `&self`; implementations keep whatever mutable state they
/// need (such as the current frame) behind interior mutability.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Loads `url`, failing if the navigation does not finish within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Reads `document.readyState` of the top-level document
    async fn ready_state(&self) -> Result<ReadyState, BrowserError>;

    /// Runs a script body in the current frame
    ///
    /// The script sees its arguments as `arguments[0..]` and reports a value
    /// with `return`. Scripts without a return value yield `Value::Null`.
    async fn run_script(
        &self,
        script: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, BrowserError>;

    /// Lists the anchors of `zone` in document order
    async fn find_links(&self, zone: LinkZone) -> Result<Vec<LinkCandidate>, BrowserError>;

    /// Lists the iframes of the top-level document
    async fn find_frames(&self) -> Result<Vec<FrameRef>, BrowserError>;

    /// Makes `frame` the context for subsequent scripts and link lookups
    async fn switch_to_frame(&self, frame: &FrameRef) -> Result<(), BrowserError>;

    /// Returns to the top-level document
    async fn switch_to_default(&self) -> Result<(), BrowserError>;

    /// Clicks whatever is at viewport point (x, y)
    ///
    /// Fails with `BrowserError::ClickIntercepted` if another element covers
    /// the target.
    async fn click_at(&self, x: u32, y: u32) -> Result<ClickOutcome, BrowserError>;

    /// Shuts the browser down
    async fn quit(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
