//! Session controller operations built on `BrowserSession`
//!
//! These functions pace the browser like a human visitor: pauses after
//! navigation, scrolling for lazy-loaded listings, and a few random clicks.
//! Interaction failures are reported but never abort a crawl.

use super::scripts;
use super::{BrowserError, BrowserSession, FrameRef, LinkCandidate, LinkZone, PageLinks, ReadyState};
use crate::config::PacingConfig;
use crate::retry::{sleep_or_cancel, RetryError, RetryPolicy};
use crate::ScoutError;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// How often readiness is polled
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on the readiness wait
const MAX_READY_WAIT: Duration = Duration::from_secs(30);

/// Pixels scrolled before retrying an intercepted click
const INTERCEPT_SCROLL_PX: i64 = 100;

/// Pause between the intercept scroll and the retry
const INTERCEPT_RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Pause after a failed scroll iteration
const SCROLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Counts of what dynamic-content triggering achieved on one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionReport {
    pub scrolls: usize,
    pub clicks: usize,
}

/// Polls `document.readyState` until the document is complete
///
/// # Arguments
///
/// * `session` - The browser session
/// * `timeout` - Maximum time to wait
/// * `cancel` - Stops waiting when cancelled
///
/// # Returns
///
/// The final ready state, or `BrowserError::Timeout` if the document never
/// produced a body within `timeout`
pub async fn wait_until_ready(
    session: &dyn BrowserSession,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ReadyState, BrowserError> {
    let started = Instant::now();
    let mut state = ReadyState::Loading;

    loop {
        match session.ready_state().await {
            Ok(ReadyState::Complete) => return Ok(ReadyState::Complete),
            Ok(current) => state = current,
            Err(e) => tracing::debug!("Ready state unavailable for {}: {}", url, e),
        }

        if started.elapsed() >= timeout {
            break;
        }
        if !sleep_or_cancel(READY_POLL_INTERVAL, cancel).await {
            return Ok(state);
        }
    }

    if state.has_body() {
        tracing::debug!("{} never completed loading; continuing with partial document", url);
        Ok(state)
    } else {
        Err(BrowserError::Timeout {
            url: url.to_string(),
            after: timeout,
        })
    }
}

/// Navigates to `url` and waits until the page is ready to be read
///
/// Navigation and the readiness wait are retried together under `policy`.
/// After the page is ready the visitor "reads" it for a randomized dwell.
pub async fn load_page(
    session: &dyn BrowserSession,
    url: &str,
    timeout: Duration,
    pacing: &PacingConfig,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<(), ScoutError> {
    let ready_timeout = MAX_READY_WAIT.min(timeout / 2);
    let settle = pacing.settle();

    let loaded = policy
        .run(
            "navigate",
            cancel,
            BrowserError::is_transient,
            |attempt| async move {
                tracing::debug!("Navigating to {} (attempt {})", url, attempt);
                session.navigate(url, timeout).await?;
                sleep_or_cancel(settle, cancel).await;
                wait_until_ready(session, url, ready_timeout, cancel).await
            },
        )
        .await;

    match loaded {
        Ok(state) => tracing::trace!("{} ready ({:?})", url, state),
        Err(RetryError::Cancelled) => return Err(ScoutError::Cancelled),
        Err(RetryError::Exhausted { last, .. }) | Err(RetryError::Rejected(last)) => {
            return Err(ScoutError::Navigation {
                url: url.to_string(),
                source: last,
            })
        }
    }

    pause(pacing.post_ready(), cancel).await?;
    pause(pacing.dwell(), cancel).await
}

/// Scrolls to the bottom until the page height stops growing
///
/// # Returns
///
/// The number of scrolls that revealed new content. Fails only if the page
/// height cannot be read at all.
pub async fn scroll_to_load(
    session: &dyn BrowserSession,
    pacing: &PacingConfig,
    cancel: &CancellationToken,
) -> Result<usize, ScoutError> {
    let mut last_height = scroll_height(session)
        .await
        .map_err(ScoutError::Interaction)?;
    let mut attempts = 0;
    let mut grown = 0;

    while attempts < pacing.max_scrolls {
        match scroll_once(session, pacing.scroll_pause(), cancel).await {
            Ok(None) => return Err(ScoutError::Cancelled),
            Ok(Some(height)) if height == last_height => {
                tracing::debug!("No more new content after {} scrolls", grown);
                break;
            }
            Ok(Some(height)) => {
                last_height = height;
                attempts += 1;
                grown += 1;
                tracing::trace!("Scroll {} done (height {})", attempts, height);
            }
            Err(e) => {
                attempts += 1;
                tracing::warn!("Scroll iteration {} failed: {}", attempts, e);
                pause(SCROLL_ERROR_PAUSE, cancel).await?;
            }
        }
    }

    Ok(grown)
}

/// Clicks `clicks` random viewport points to trigger lazy content
///
/// Anchors and buttons that look like logout/sign-out actions are skipped.
/// An intercepted click is retried once after scrolling a little.
///
/// # Returns
///
/// The number of successful clicks. Fails only if the viewport size cannot be
/// read.
pub async fn random_clicks(
    session: &dyn BrowserSession,
    clicks: u32,
    pause_between: Duration,
    cancel: &CancellationToken,
) -> Result<usize, ScoutError> {
    let (width, height) = viewport_size(session)
        .await
        .map_err(ScoutError::Interaction)?;
    let mut successful = 0;

    for i in 1..=clicks {
        let x = rand::random_range(0..width.max(1));
        let y = rand::random_range(0..height.max(1));

        match session
            .run_script(scripts::ELEMENT_AT_POINT, &[Value::from(x), Value::from(y)])
            .await
        {
            Ok(Value::Null) => {
                tracing::debug!("Random click {} at ({}, {}) found no element", i, x, y);
            }
            Ok(element) if is_sign_out_target(&element) => {
                tracing::debug!("Skipping click on logout/sign-out element at ({}, {})", x, y);
                continue;
            }
            Ok(_) => {
                if click_with_recovery(session, i, x, y, cancel).await? {
                    successful += 1;
                }
            }
            Err(e) => tracing::warn!("Random click {} failed at ({}, {}): {}", i, x, y, e),
        }

        pause(pause_between, cancel).await?;
    }

    Ok(successful)
}

/// Scrolls, clicks, then lets the page settle
///
/// Both steps always run. If either failed, the first failure is returned as
/// `ScoutError::Interaction` after the settle pause; callers treat that as a
/// degraded page, not a failed one.
pub async fn trigger_dynamic_content(
    session: &dyn BrowserSession,
    pacing: &PacingConfig,
    cancel: &CancellationToken,
) -> Result<InteractionReport, ScoutError> {
    let mut report = InteractionReport::default();
    let mut failure = None;

    match scroll_to_load(session, pacing, cancel).await {
        Ok(scrolls) => report.scrolls = scrolls,
        Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
        Err(e) => failure = Some(e),
    }

    match random_clicks(session, pacing.click_count(), pacing.click_pause(), cancel).await {
        Ok(clicks) => report.clicks = clicks,
        Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
        Err(e) => {
            failure.get_or_insert(e);
        }
    }

    pause(pacing.post_interaction(), cancel).await?;

    tracing::debug!(
        "Dynamic content: {} scrolls, {} clicks",
        report.scrolls,
        report.clicks
    );

    match failure {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

/// Reads the document's links, partitioned into zones
pub async fn page_links(session: &dyn BrowserSession) -> Result<PageLinks, BrowserError> {
    Ok(PageLinks {
        document: session.find_links(LinkZone::Document).await?,
        header: session.find_links(LinkZone::Header).await?,
        footer: session.find_links(LinkZone::Footer).await?,
        nav: session.find_links(LinkZone::Nav).await?,
    })
}

/// Reads the links inside `frame`
///
/// The session is always switched back to the top-level document, even when
/// reading the frame fails.
pub async fn frame_links(
    session: &dyn BrowserSession,
    frame: &FrameRef,
) -> Result<Vec<LinkCandidate>, BrowserError> {
    session.switch_to_frame(frame).await?;
    let links = session.find_links(LinkZone::Document).await;
    let restored = session.switch_to_default().await;

    let links = links?;
    restored?;
    Ok(links)
}

async fn click_with_recovery(
    session: &dyn BrowserSession,
    i: u32,
    x: u32,
    y: u32,
    cancel: &CancellationToken,
) -> Result<bool, ScoutError> {
    match session.click_at(x, y).await {
        Ok(super::ClickOutcome::Clicked) => {
            tracing::debug!("Random click {} at ({}, {})", i, x, y);
            Ok(true)
        }
        Ok(super::ClickOutcome::NoTarget) => Ok(false),
        Err(BrowserError::ClickIntercepted { .. }) => {
            if let Err(e) = session
                .run_script(scripts::SCROLL_BY, &[Value::from(INTERCEPT_SCROLL_PX)])
                .await
            {
                tracing::debug!("Scroll before click retry failed: {}", e);
            }
            pause(INTERCEPT_RETRY_PAUSE, cancel).await?;

            match session.click_at(x, y).await {
                Ok(super::ClickOutcome::Clicked) => {
                    tracing::debug!("Random click {} succeeded after scrolling", i);
                    Ok(true)
                }
                _ => {
                    tracing::debug!("Random click {} failed even after scrolling", i);
                    Ok(false)
                }
            }
        }
        Err(e) => {
            tracing::warn!("Random click {} failed at ({}, {}): {}", i, x, y, e);
            Ok(false)
        }
    }
}

fn is_sign_out_target(element: &Value) -> bool {
    let tag = element.get("tag").and_then(Value::as_str).unwrap_or_default();
    if tag != "a" && tag != "button" {
        return false;
    }
    let href = element
        .get("href")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    href.contains("logout") || href.contains("sign-out")
}

/// Scrolls to the bottom and reads the new height; `None` if cancelled
async fn scroll_once(
    session: &dyn BrowserSession,
    pause_after: Duration,
    cancel: &CancellationToken,
) -> Result<Option<u64>, BrowserError> {
    session.run_script(scripts::SCROLL_TO_BOTTOM, &[]).await?;
    if !sleep_or_cancel(pause_after, cancel).await {
        return Ok(None);
    }
    scroll_height(session).await.map(Some)
}

async fn scroll_height(session: &dyn BrowserSession) -> Result<u64, BrowserError> {
    let value = session.run_script(scripts::SCROLL_HEIGHT, &[]).await?;
    Ok(value.as_f64().unwrap_or(0.0).max(0.0) as u64)
}

async fn viewport_size(session: &dyn BrowserSession) -> Result<(u32, u32), BrowserError> {
    let value = session.run_script(scripts::VIEWPORT_SIZE, &[]).await?;
    let dimension = |i: usize| {
        value
            .get(i)
            .and_then(Value::as_f64)
            .map(|v| v.max(0.0) as u32)
            .ok_or_else(|| BrowserError::Script(format!("unexpected viewport size: {}", value)))
    };
    Ok((dimension(0)?, dimension(1)?))
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), ScoutError> {
    if sleep_or_cancel(duration, cancel).await {
        Ok(())
    } else {
        Err(ScoutError::Cancelled)
    }
}
