//! chromiumoxide-backed browser session

use super::scripts;
use super::{
    BrowserError, BrowserLauncher, BrowserSession, ClickOutcome, FrameRef, LaunchOptions,
    LinkCandidate, LinkZone, ReadyState,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Marker a frame-wrapped script returns when the frame cannot be entered
const FRAME_UNAVAILABLE: &str = "__frameUnavailable";

/// Launches a local Chromium through chromiumoxide
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self
    }

    fn browser_config(options: &LaunchOptions) -> Result<ChromeConfig, BrowserError> {
        let mut builder = ChromeConfig::builder().request_timeout(options.timeout);

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if options.ignore_certificate_errors {
            builder = builder
                .arg("--ignore-certificate-errors")
                .arg("--allow-insecure-localhost");
        }
        for arg in &options.args {
            builder = builder.arg(arg.as_str());
        }
        if !options.user_agent.is_empty() {
            builder = builder.arg(format!("--user-agent={}", options.user_agent));
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let config = Self::browser_config(options)?;

        tracing::info!(
            "Launching Chromium (headless: {}, timeout: {:?})",
            options.headless,
            options.timeout
        );

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drive CDP events until the connection closes
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        if !options.user_agent.is_empty() {
            if let Err(e) = page.set_user_agent(options.user_agent.as_str()).await {
                tracing::warn!("Failed to set user agent: {}", e);
            }
        }

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
            frame: Mutex::new(None),
        }))
    }
}

/// One Chromium process with a single tab
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// Index of the iframe scripts currently run against
    frame: Mutex<Option<usize>>,
}

impl ChromiumSession {
    fn current_frame(&self) -> Option<usize> {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_frame(&self, frame: Option<usize>) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = frame;
    }

    async fn evaluate(
        &self,
        script: &str,
        args: &[Value],
        frame: Option<usize>,
    ) -> Result<Value, BrowserError> {
        let expression = wrap_script(script, args, frame);
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        let value = result.value().cloned().unwrap_or(Value::Null);

        if let Some(index) = frame {
            if value.get(FRAME_UNAVAILABLE).is_some() {
                return Err(BrowserError::FrameUnavailable(index));
            }
        }
        Ok(value)
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.set_frame(None);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Err(_) => Err(BrowserError::Timeout {
                url: url.to_string(),
                after: timeout,
            }),
        }
    }

    async fn ready_state(&self) -> Result<ReadyState, BrowserError> {
        let value = self.evaluate(scripts::READY_STATE, &[], None).await?;
        Ok(ReadyState::parse(value.as_str().unwrap_or_default()))
    }

    async fn run_script(&self, script: &str, args: &[Value]) -> Result<Value, BrowserError> {
        self.evaluate(script, args, self.current_frame()).await
    }

    async fn find_links(&self, zone: LinkZone) -> Result<Vec<LinkCandidate>, BrowserError> {
        let value = self
            .run_script(scripts::ZONE_LINKS, &[Value::from(zone.selector())])
            .await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn find_frames(&self) -> Result<Vec<FrameRef>, BrowserError> {
        let value = self.evaluate(scripts::FRAMES, &[], None).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn switch_to_frame(&self, frame: &FrameRef) -> Result<(), BrowserError> {
        // Probe from the top-level document before committing
        self.evaluate("return null;", &[], Some(frame.index)).await?;
        self.set_frame(Some(frame.index));
        Ok(())
    }

    async fn switch_to_default(&self) -> Result<(), BrowserError> {
        self.set_frame(None);
        Ok(())
    }

    async fn click_at(&self, x: u32, y: u32) -> Result<ClickOutcome, BrowserError> {
        let value = self
            .run_script(scripts::CLICK_AT_POINT, &[Value::from(x), Value::from(y)])
            .await?;
        match value.as_str() {
            Some("clicked") => Ok(ClickOutcome::Clicked),
            Some("intercepted") => Err(BrowserError::ClickIntercepted { x, y }),
            _ => Ok(ClickOutcome::NoTarget),
        }
    }

    async fn quit(self: Box<Self>) -> Result<(), BrowserError> {
        let mut this = *self;
        let closed = this.browser.close().await;
        let _ = this.browser.wait().await;
        this.handler.abort();
        closed.map(|_| ()).map_err(|e| BrowserError::Cdp(e.to_string()))
    }
}

/// Builds the expression that runs `script` with `args`
///
/// Inside a frame, `document` and `window` are rebound to the frame's
/// content document and window. Cross-origin frames have no accessible
/// content document and yield the frame-unavailable marker instead.
pub(crate) fn wrap_script(script: &str, args: &[Value], frame: Option<usize>) -> String {
    let args = Value::Array(args.to_vec()).to_string();
    match frame {
        None => format!("(function() {{\n{}\n}}).apply(null, {})", script, args),
        Some(index) => format!(
            "(function() {{\n\
             var __frame = window.document.querySelectorAll('iframe')[{index}];\n\
             if (!__frame || !__frame.contentDocument) {{ return {{ \"{marker}\": true }}; }}\n\
             return (function(document, window) {{\n\
             return (function() {{\n{script}\n}}).apply(null, {args});\n\
             }})(__frame.contentDocument, __frame.contentWindow);\n\
             }})()",
            index = index,
            marker = FRAME_UNAVAILABLE,
            script = script,
            args = args,
        ),
    }
}
