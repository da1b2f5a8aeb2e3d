//! Crawl-scoped state

use super::report::PageReport;
use crate::browser::BrowserSession;
use crate::extract::JobPosting;
use crate::state::VisitedSet;
use crate::ScoutError;
use url::Url;

/// Everything one crawl owns: the browser, the visited set and the results
///
/// The browser is released at most once; after `release` every browser
/// access fails with `ScoutError::SessionReleased`.
pub struct CrawlSession {
    pub(crate) browser: Option<Box<dyn BrowserSession>>,
    pub(crate) visited: VisitedSet,
    pub(crate) postings: Vec<JobPosting>,
    pub(crate) pages: Vec<PageReport>,
    pub(crate) site: Url,
}

impl CrawlSession {
    pub fn new(browser: Box<dyn BrowserSession>, site: Url) -> Self {
        Self {
            browser: Some(browser),
            visited: VisitedSet::new(),
            postings: Vec::new(),
            pages: Vec::new(),
            site,
        }
    }

    /// The live browser session
    pub fn browser(&self) -> Result<&dyn BrowserSession, ScoutError> {
        self.browser.as_deref().ok_or(ScoutError::SessionReleased)
    }

    /// The start URL; its host bounds the crawl
    pub fn site(&self) -> &Url {
        &self.site
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn postings(&self) -> &[JobPosting] {
        &self.postings
    }

    pub fn is_released(&self) -> bool {
        self.browser.is_none()
    }

    /// Shuts the browser down; later calls do nothing
    pub async fn release(&mut self) {
        if let Some(browser) = self.browser.take() {
            tracing::info!("Closing browser");
            if let Err(e) = browser.quit().await {
                tracing::warn!("Browser did not shut down cleanly: {}", e);
            }
        }
    }

    /// Moves the accumulated results out of the session
    pub(crate) fn take_results(&mut self) -> (Vec<JobPosting>, Vec<PageReport>) {
        (
            std::mem::take(&mut self.postings),
            std::mem::take(&mut self.pages),
        )
    }
}

impl Drop for CrawlSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            tracing::warn!("Crawl session for {} dropped without releasing its browser", self.site);
        }
    }
}
