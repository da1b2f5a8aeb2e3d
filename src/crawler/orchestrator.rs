//! Crawl orchestration
//!
//! The orchestrator owns the per-page pipeline: load, interact, read iframes,
//! enumerate links, classify, truncate, detect dead ends, convert and extract
//! where an apply signal was seen, then hand the accepted links to the
//! frontier. Traversal is depth-first over an explicit stack.

use super::page::{candidate_href, has_apply_signal, PageTracker};
use super::report::{CrawlReport, CrawlTask, PageOutcome, PageReport};
use super::session::CrawlSession;
use super::CrawlParams;
use crate::browser::{
    frame_links, load_page, page_links, trigger_dynamic_content, BrowserLauncher,
    BrowserSession, ChromiumLauncher, FrameRef, LinkCandidate,
};
use crate::config::Config;
use crate::convert::{is_error_marker, ContentConverter, PageConverter};
use crate::extract::{JobExtractor, JobPosting, LinkClassifier};
use crate::oracle::{OpenAiOracle, OracleError, TextCompletionOracle};
use crate::retry::sleep_or_cancel;
use crate::state::{CrawlPhase, VisitedSet};
use crate::url::{is_same_site, normalize_url, strip_fragment};
use crate::{ConfigError, Disposition, ErrorKind, ScoutError};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Drives crawls of careers sites
pub struct Orchestrator {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    classifier: LinkClassifier,
    extractor: JobExtractor,
    converter: Arc<dyn PageConverter>,
}

impl Orchestrator {
    /// Creates an orchestrator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Pacing, retry and oracle settings
    /// * `launcher` - Starts one browser session per crawl
    /// * `oracle` - Answers both link classification and extraction prompts
    /// * `converter` - Turns page URLs into plain text
    pub fn new(
        config: Arc<Config>,
        launcher: Arc<dyn BrowserLauncher>,
        oracle: Arc<dyn TextCompletionOracle>,
        converter: Arc<dyn PageConverter>,
    ) -> Self {
        let classifier =
            LinkClassifier::new(Arc::clone(&oracle), config.retry.classification.clone())
                .with_temperature(config.oracle.temperature);
        let extractor = JobExtractor::new(
            oracle,
            config.retry.extraction.clone(),
            config.converter.chunk_size,
        )
        .with_temperature(config.oracle.temperature);

        Self {
            config,
            launcher,
            classifier,
            extractor,
            converter,
        }
    }

    /// Creates an orchestrator backed by Chromium, the OpenAI API and the
    /// reader service
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - All clients were built
    /// * `Err(ScoutError::Config)` - The API key is missing or a client could not be built
    pub fn from_config(config: Config) -> Result<Self, ScoutError> {
        let oracle = OpenAiOracle::from_config(&config.oracle).map_err(|e| match e {
            OracleError::MissingApiKey(var) => ConfigError::MissingEnv(var),
            other => ConfigError::Validation(format!("oracle client: {}", other)),
        })?;

        let converter = ContentConverter::from_config(
            &config.converter,
            &config.browser.user_agent,
            config.retry.conversion.clone(),
        )
        .map_err(|e| ConfigError::Validation(format!("converter client: {}", e)))?;

        Ok(Self::new(
            Arc::new(config),
            Arc::new(ChromiumLauncher::new()),
            Arc::new(oracle),
            Arc::new(converter),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls one site
    ///
    /// Page-level failures never escape: they are logged, recorded in the
    /// report and the crawl continues with the next frontier entry. The
    /// browser is released exactly once, whatever happens during traversal.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran, possibly cut short by cancellation
    /// * `Err(ScoutError::UrlError)` - The start URL is not a crawlable URL
    /// * `Err(ScoutError::SessionInit)` - No browser could be started
    pub async fn run(
        &self,
        params: &CrawlParams,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, ScoutError> {
        params.validate()?;
        let started_at = Utc::now();
        let site = normalize_url(&params.start_url)?;

        tracing::info!(
            "Starting crawl of {} (max depth {}, max breadth {})",
            site,
            params.max_depth,
            params.max_breadth
        );

        let options = self
            .config
            .browser
            .launch_options(params.headless, params.timeout);
        let browser = self
            .launcher
            .launch(&options)
            .await
            .map_err(ScoutError::SessionInit)?;

        let mut session = CrawlSession::new(browser, site);
        let traversal = AssertUnwindSafe(self.traverse(&mut session, params, cancel))
            .catch_unwind()
            .await;
        session.release().await;

        let error = match traversal {
            Ok(Ok(())) | Ok(Err(ScoutError::Cancelled)) => None,
            Ok(Err(e)) => {
                tracing::error!("Crawl of {} stopped: {}", session.site(), e);
                Some(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Crawl of {} panicked: {}", session.site(), message);
                Some(message)
            }
        };

        let cancelled = cancel.is_cancelled();
        let visited = session.visited().len();
        let (postings, pages) = session.take_results();

        let report = CrawlReport {
            start_url: session.site().to_string(),
            started_at,
            finished_at: Utc::now(),
            postings,
            pages,
            visited,
            cancelled,
            error,
        };

        tracing::info!(
            "Crawl of {} finished: {} postings from {} pages ({} URLs visited){}",
            report.start_url,
            report.postings.len(),
            report.pages_visited(),
            report.visited,
            if cancelled { ", cancelled" } else { "" }
        );

        Ok(report)
    }

    /// Depth-first traversal over an explicit stack
    ///
    /// URLs are marked visited when they are pushed, so no URL is ever
    /// queued twice.
    async fn traverse(
        &self,
        session: &mut CrawlSession,
        params: &CrawlParams,
        cancel: &CancellationToken,
    ) -> Result<(), ScoutError> {
        let start = session.site().to_string();
        session.visited.mark_visited(&start);
        let mut frontier = vec![CrawlTask::new(start, 0)];

        while let Some(task) = frontier.pop() {
            if cancel.is_cancelled() {
                tracing::info!("Crawl cancelled with {} URLs left on the frontier", frontier.len() + 1);
                return Err(ScoutError::Cancelled);
            }

            if task.depth >= params.max_depth {
                tracing::debug!("Depth cap reached at {}", task.url);
                session.pages.push(PageReport::skipped(&task));
                continue;
            }

            tracing::info!("Exploring {} at depth {}", task.url, task.depth);

            let span = tracing::info_span!("page", url = %task.url, depth = task.depth);
            let mut tracker = PageTracker::new(task.clone());
            let step = AssertUnwindSafe(
                self.process_page(session, &mut tracker, &task, params, cancel)
                    .instrument(span),
            )
            .catch_unwind()
            .await;

            match step {
                Ok(Ok(children)) => {
                    let outcome = tracker.success_outcome(children.len());
                    session.pages.push(tracker.into_report(outcome));
                    // Reversed so the first accepted link is explored first
                    frontier.extend(children.into_iter().rev());
                }
                Ok(Err(e)) => {
                    tracker.fail();
                    session
                        .pages
                        .push(tracker.into_report(PageOutcome::Abandoned(e.kind())));

                    if e.disposition() == Disposition::AbortCrawl {
                        return Err(e);
                    }
                    tracing::warn!("Abandoning {}: {}", task.url, e);
                }
                Err(panic) => {
                    let e = ScoutError::PagePanic {
                        url: task.url.clone(),
                        message: panic_message(panic.as_ref()),
                    };
                    tracing::error!("{}", e);
                    tracker.fail();
                    session
                        .pages
                        .push(tracker.into_report(PageOutcome::Abandoned(ErrorKind::Panic)));
                }
            }
        }

        Ok(())
    }

    /// Runs the page pipeline on one URL and returns the children to explore
    async fn process_page(
        &self,
        session: &mut CrawlSession,
        tracker: &mut PageTracker,
        task: &CrawlTask,
        params: &CrawlParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<CrawlTask>, ScoutError> {
        let CrawlSession {
            browser,
            visited,
            postings,
            site,
            ..
        } = session;
        let browser = browser.as_deref().ok_or(ScoutError::SessionReleased)?;
        let pacing = &self.config.pacing;

        tracker.advance(CrawlPhase::FetchingPage)?;
        load_page(
            browser,
            &task.url,
            params.timeout,
            pacing,
            &self.config.retry.navigation,
            cancel,
        )
        .await?;

        match trigger_dynamic_content(browser, pacing, cancel).await {
            Ok(_) => {}
            Err(e) if e.disposition() == Disposition::Degrade => {
                tracing::warn!("Continuing without dynamic content: {}", e);
            }
            Err(e) => return Err(e),
        }

        let mut accepted = Vec::new();
        let mut seen = HashSet::new();

        let frames = match browser.find_frames().await {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!("Could not list iframes: {}", e);
                Vec::new()
            }
        };
        for frame in &frames {
            let found = self
                .process_frame(browser, frame, site, visited, tracker, cancel)
                .await?;
            let Some((found, links)) = found else {
                continue;
            };
            tracker.postings += found.len();
            postings.extend(found);

            for link in &links {
                self.consider_link(
                    link,
                    site,
                    &HashSet::new(),
                    visited,
                    &mut seen,
                    &mut accepted,
                    tracker,
                    params.max_breadth,
                    cancel,
                )
                .await?;
            }
        }

        tracker.advance(CrawlPhase::EnumeratingLinks)?;
        let links = page_links(browser).await.map_err(ScoutError::Browser)?;
        let ignored = links.ignored_hrefs();
        tracing::debug!(
            "{} document links, {} ignored in header/footer/nav",
            links.document.len(),
            ignored.len()
        );

        tracker.advance(CrawlPhase::ClassifyingLinks)?;
        for link in &links.document {
            if link.href.trim().is_empty() {
                continue;
            }
            if has_apply_signal(&link.text) {
                if !tracker.apply_signal {
                    tracing::info!("Apply link found: {}", link.text.trim());
                }
                tracker.apply_signal = true;
            }

            self.consider_link(
                link,
                site,
                &ignored,
                visited,
                &mut seen,
                &mut accepted,
                tracker,
                params.max_breadth,
                cancel,
            )
            .await?;
        }

        tracker.links_accepted = accepted.len();
        accepted.truncate(params.max_breadth);

        if accepted.is_empty() && !tracker.apply_signal {
            tracing::info!("Dead end: no job links and no apply link on {}", task.url);
            tracker.dead_end = true;
            tracker.advance(CrawlPhase::Done)?;
            return Ok(Vec::new());
        }

        if tracker.apply_signal {
            if !sleep_or_cancel(pacing.pre_convert(), cancel).await {
                return Err(ScoutError::Cancelled);
            }
            tracker.advance(CrawlPhase::ConvertingContent)?;
            let text = self.converter.convert(&task.url, cancel).await;

            tracker.advance(CrawlPhase::ExtractingJobs)?;
            let found = self.extract_postings(&task.url, &text, cancel).await?;
            tracker.postings += found.len();
            postings.extend(found);
        }

        tracker.advance(CrawlPhase::Recursing)?;
        let children = accepted
            .into_iter()
            .map(|href| {
                visited.mark_visited(&href);
                CrawlTask::new(href, task.depth + 1)
            })
            .collect();
        tracker.advance(CrawlPhase::Done)?;

        Ok(children)
    }

    /// Converts and extracts a same-site iframe, then reads its links
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The frame was skipped (no src, other site, already visited)
    /// * `Ok(Some((postings, links)))` - Postings found and links to consider
    async fn process_frame(
        &self,
        browser: &dyn BrowserSession,
        frame: &FrameRef,
        site: &Url,
        visited: &mut VisitedSet,
        tracker: &mut PageTracker,
        cancel: &CancellationToken,
    ) -> Result<Option<(Vec<JobPosting>, Vec<LinkCandidate>)>, ScoutError> {
        let src = strip_fragment(&frame.src);
        let same_site = Url::parse(&src)
            .map(|url| is_same_site(&url, site))
            .unwrap_or(false);
        if src.is_empty() || !same_site {
            tracing::debug!("Skipping iframe {} ({:?})", frame.index, frame.src);
            return Ok(None);
        }
        if !visited.mark_visited(&src) {
            return Ok(None);
        }

        tracing::info!("Processing iframe {}", src);

        tracker.advance(CrawlPhase::ConvertingContent)?;
        let text = self.converter.convert(&src, cancel).await;

        tracker.advance(CrawlPhase::ExtractingJobs)?;
        let found = self.extract_postings(&src, &text, cancel).await?;

        tracker.advance(CrawlPhase::EnumeratingLinks)?;
        let links = match frame_links(browser, frame).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Could not read links in iframe {}: {}", src, e);
                Vec::new()
            }
        };
        if !links.is_empty() {
            tracker.advance(CrawlPhase::ClassifyingLinks)?;
        }

        Ok(Some((found, links)))
    }

    /// Classifies one link and records it if accepted
    ///
    /// Links are still scanned after `max_breadth` links have been accepted,
    /// but no longer sent to the classifier.
    #[allow(clippy::too_many_arguments)]
    async fn consider_link(
        &self,
        link: &LinkCandidate,
        site: &Url,
        ignored: &HashSet<String>,
        visited: &VisitedSet,
        seen: &mut HashSet<String>,
        accepted: &mut Vec<String>,
        tracker: &mut PageTracker,
        max_breadth: usize,
        cancel: &CancellationToken,
    ) -> Result<(), ScoutError> {
        if accepted.len() >= max_breadth {
            return Ok(());
        }
        let Some(href) = candidate_href(link, site, ignored, visited) else {
            return Ok(());
        };
        if !seen.insert(href.clone()) {
            return Ok(());
        }

        tracker.links_classified += 1;
        let candidate = LinkCandidate::new(link.text.clone(), href.clone());
        let is_job = match self.classifier.try_classify(&candidate, cancel).await {
            Ok(is_job) => is_job,
            Err(e) if e.disposition() == Disposition::Degrade => {
                tracing::warn!("{}; treating link as non-job", e);
                false
            }
            Err(e) => return Err(e),
        };

        if is_job {
            tracing::info!("Job link: {}", href);
            accepted.push(href);
        }
        Ok(())
    }

    /// Extracts postings from converted text, skipping conversion failures
    async fn extract_postings(
        &self,
        url: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobPosting>, ScoutError> {
        if is_error_marker(text) {
            tracing::warn!("No content for {}: {}", url, text.lines().next().unwrap_or(""));
            return Ok(Vec::new());
        }

        let found = self.extractor.extract_text(text, cancel).await?;
        tracing::info!("Found {} job postings on {}", found.len(), url);
        Ok(found)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
