//! In-memory browser, oracle and converter for crawl tests

use async_trait::async_trait;
use job_scout::browser::{
    scripts, BrowserError, BrowserLauncher, BrowserSession, ClickOutcome, FrameRef,
    LaunchOptions, LinkCandidate, LinkZone, ReadyState,
};
use job_scout::config::{Config, PacingConfig};
use job_scout::convert::PageConverter;
use job_scout::crawler::{CrawlParams, Orchestrator};
use job_scout::oracle::{OracleError, TextCompletionOracle};
use job_scout::retry::RetryPolicy;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const SITE: &str = "https://careers.example.com/";

/// Absolute URL on the test site
pub fn url(path: &str) -> String {
    format!("https://careers.example.com{}", path)
}

#[derive(Debug, Clone, Default)]
pub struct FakeFrame {
    pub src: String,
    pub links: Vec<LinkCandidate>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub links: Vec<LinkCandidate>,
    pub header: Vec<LinkCandidate>,
    pub footer: Vec<LinkCandidate>,
    pub nav: Vec<LinkCandidate>,
    pub frames: Vec<FakeFrame>,
    pub fails: bool,
    pub panics: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(mut self, text: &str, href: &str) -> Self {
        self.links.push(LinkCandidate::new(text, href));
        self
    }

    pub fn nav_link(mut self, text: &str, href: &str) -> Self {
        self.nav.push(LinkCandidate::new(text, href));
        self
    }

    pub fn frame(mut self, src: &str, links: Vec<LinkCandidate>) -> Self {
        self.frames.push(FakeFrame {
            src: src.to_string(),
            links,
        });
        self
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }
}

/// A site map plus a record of what the browser did
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    navigations: Mutex<Vec<String>>,
    launches: AtomicUsize,
    quits: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

pub struct FakeLauncher {
    site: Arc<FakeSite>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self { site, fail: false }
    }

    pub fn failing(site: Arc<FakeSite>) -> Self {
        Self { site, fail: true }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.fail {
            return Err(BrowserError::Launch("chrome not found".to_string()));
        }
        self.site.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
            frame: Mutex::new(None),
        }))
    }
}

struct FakeSession {
    site: Arc<FakeSite>,
    current: Mutex<Option<String>>,
    frame: Mutex<Option<usize>>,
}

impl FakeSession {
    fn current_page(&self) -> FakePage {
        let current = self.current.lock().unwrap().clone();
        current
            .and_then(|url| self.site.pages.get(&url).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.site.navigations.lock().unwrap().push(url.to_string());

        let page = self.site.pages.get(url).cloned().unwrap_or_default();
        if page.panics {
            panic!("renderer crashed on {}", url);
        }
        if page.fails {
            return Err(BrowserError::Navigation("net::ERR_CONNECTION_RESET".to_string()));
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        *self.frame.lock().unwrap() = None;
        Ok(())
    }

    async fn ready_state(&self) -> Result<ReadyState, BrowserError> {
        Ok(ReadyState::Complete)
    }

    async fn run_script(&self, script: &str, _args: &[Value]) -> Result<Value, BrowserError> {
        match script {
            scripts::SCROLL_HEIGHT => Ok(json!(1200)),
            scripts::VIEWPORT_SIZE => Ok(json!([800, 600])),
            _ => Ok(Value::Null),
        }
    }

    async fn find_links(&self, zone: LinkZone) -> Result<Vec<LinkCandidate>, BrowserError> {
        let page = self.current_page();
        let frame = *self.frame.lock().unwrap();
        if let Some(index) = frame {
            return page
                .frames
                .get(index)
                .map(|frame| frame.links.clone())
                .ok_or(BrowserError::FrameUnavailable(index));
        }

        Ok(match zone {
            LinkZone::Document => {
                let mut all = page.header.clone();
                all.extend(page.nav.iter().cloned());
                all.extend(page.links.iter().cloned());
                all.extend(page.footer.iter().cloned());
                all
            }
            LinkZone::Header => page.header,
            LinkZone::Footer => page.footer,
            LinkZone::Nav => page.nav,
        })
    }

    async fn find_frames(&self) -> Result<Vec<FrameRef>, BrowserError> {
        Ok(self
            .current_page()
            .frames
            .iter()
            .enumerate()
            .map(|(index, frame)| FrameRef {
                index,
                src: frame.src.clone(),
            })
            .collect())
    }

    async fn switch_to_frame(&self, frame: &FrameRef) -> Result<(), BrowserError> {
        *self.frame.lock().unwrap() = Some(frame.index);
        Ok(())
    }

    async fn switch_to_default(&self) -> Result<(), BrowserError> {
        *self.frame.lock().unwrap() = None;
        Ok(())
    }

    async fn click_at(&self, _x: u32, _y: u32) -> Result<ClickOutcome, BrowserError> {
        Ok(ClickOutcome::Clicked)
    }

    async fn quit(self: Box<Self>) -> Result<(), BrowserError> {
        self.site.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Answers classification prompts from a set of job hrefs and extraction
/// prompts from `POSTING: <title>` lines in the text
#[derive(Default)]
pub struct FakeOracle {
    job_hrefs: HashSet<String>,
    fail_classification: bool,
    classified: Mutex<Vec<String>>,
    extractions: AtomicUsize,
}

impl FakeOracle {
    pub fn with_jobs<I, S>(hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            job_hrefs: hrefs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn failing_classification() -> Self {
        Self {
            fail_classification: true,
            ..Self::default()
        }
    }

    /// Hrefs sent for classification, in order
    pub fn classified(&self) -> Vec<String> {
        self.classified.lock().unwrap().clone()
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletionOracle for FakeOracle {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, OracleError> {
        if let Some((_, rest)) = prompt.rsplit_once("link URL: \"") {
            let href = rest.trim_end_matches('"').to_string();
            self.classified.lock().unwrap().push(href.clone());
            if self.fail_classification {
                return Err(OracleError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                });
            }
            let answer = if self.job_hrefs.contains(&href) { "YES" } else { "" };
            return Ok(answer.to_string());
        }

        self.extractions.fetch_add(1, Ordering::SeqCst);
        let postings: Vec<Value> = prompt
            .lines()
            .filter_map(|line| line.trim().strip_prefix("POSTING: "))
            .map(|title| json!({ "title": title, "location": "Remote" }))
            .collect();
        Ok(Value::Array(postings).to_string())
    }
}

/// Returns canned text per URL; unknown URLs yield an error marker
#[derive(Default)]
pub struct FakeConverter {
    texts: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, url: impl Into<String>, text: &str) -> Self {
        self.texts.insert(url.into(), text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageConverter for FakeConverter {
    async fn convert(&self, url: &str, _cancel: &CancellationToken) -> String {
        self.calls.lock().unwrap().push(url.to_string());
        self.texts
            .get(url)
            .cloned()
            .unwrap_or_else(|| job_scout::convert::error_marker(url, "HTTP 503"))
    }
}

/// Configuration with no waits and no retries
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.pacing = PacingConfig::instant();
    config.retry.navigation = RetryPolicy::none();
    config.retry.conversion = RetryPolicy::none();
    config.retry.classification = RetryPolicy::none();
    config.retry.extraction = RetryPolicy::none();
    config
}

pub fn params() -> CrawlParams {
    CrawlParams::new(SITE).with_timeout(Duration::from_secs(5))
}

/// Test fixture holding the fakes behind an orchestrator
pub struct Harness {
    pub site: Arc<FakeSite>,
    pub oracle: Arc<FakeOracle>,
    pub converter: Arc<FakeConverter>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(site: FakeSite, oracle: FakeOracle, converter: FakeConverter) -> Self {
        let site = Arc::new(site);
        let launcher = Arc::new(FakeLauncher::new(Arc::clone(&site)));
        Self::with_launcher(site, launcher, oracle, converter)
    }

    pub fn with_launcher(
        site: Arc<FakeSite>,
        launcher: Arc<dyn BrowserLauncher>,
        oracle: FakeOracle,
        converter: FakeConverter,
    ) -> Self {
        let oracle = Arc::new(oracle);
        let converter = Arc::new(converter);
        let orchestrator = Orchestrator::new(
            Arc::new(test_config()),
            launcher,
            Arc::clone(&oracle) as Arc<dyn TextCompletionOracle>,
            Arc::clone(&converter) as Arc<dyn PageConverter>,
        );

        Self {
            site,
            oracle,
            converter,
            orchestrator,
        }
    }
}
