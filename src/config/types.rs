use crate::browser::LaunchOptions;
use crate::retry::RetryPolicy;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User agent presented by the browser and the fallback fetcher
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Main configuration structure for Job-Scout
///
/// Every section is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    pub pacing: PacingConfig,
    pub oracle: OracleConfig,
    pub converter: ConverterConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Pages at this depth or deeper are never visited
    pub max_depth: u32,

    /// Maximum number of links followed from one page
    pub max_breadth: usize,

    /// Page load timeout (seconds)
    pub timeout_secs: u64,

    /// Run the browser without a window
    pub headless: bool,

    /// Start URLs crawled in addition to those given on the command line
    pub seeds: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_breadth: 17,
            timeout_secs: 60,
            headless: true,
            seeds: Vec::new(),
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub user_agent: String,

    /// Stability flags passed to the browser
    pub chrome_args: Vec<String>,

    pub ignore_certificate_errors: bool,

    /// Path to the browser binary; auto-detected when unset
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_args: [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-extensions",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignore_certificate_errors: true,
            executable: None,
        }
    }
}

impl BrowserConfig {
    /// Builds launch options for one crawl
    pub fn launch_options(&self, headless: bool, timeout: Duration) -> LaunchOptions {
        LaunchOptions {
            headless,
            ignore_certificate_errors: self.ignore_certificate_errors,
            args: self.chrome_args.clone(),
            user_agent: self.user_agent.clone(),
            timeout,
            executable: self.executable.clone(),
        }
    }
}

/// Human-like pauses between browser actions (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// Pause right after navigation, before the readiness wait
    pub settle_ms: u64,

    /// Pause once the document is ready
    pub post_ready_ms: u64,

    /// Randomized reading time after the page is ready
    pub dwell_min_ms: u64,
    pub dwell_max_ms: u64,

    /// Pause after each scroll to the bottom
    pub scroll_pause_ms: u64,

    /// Cap on scroll iterations per page
    pub max_scrolls: u32,

    /// Number of random clicks per page, drawn from this range
    pub min_clicks: u32,
    pub max_clicks: u32,

    /// Pause between random clicks, drawn once per page
    pub click_pause_min_ms: u64,
    pub click_pause_max_ms: u64,

    /// Pause after scrolling and clicking
    pub post_interaction_ms: u64,

    /// Pause before converting a page that carries an apply signal
    pub pre_convert_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 5000,
            post_ready_ms: 5000,
            dwell_min_ms: 10_000,
            dwell_max_ms: 17_000,
            scroll_pause_ms: 2000,
            max_scrolls: 5,
            min_clicks: 1,
            max_clicks: 3,
            click_pause_min_ms: 1000,
            click_pause_max_ms: 3000,
            post_interaction_ms: 5000,
            pre_convert_ms: 5000,
        }
    }
}

impl PacingConfig {
    /// Same actions as the default, without any pauses
    pub fn instant() -> Self {
        Self {
            settle_ms: 0,
            post_ready_ms: 0,
            dwell_min_ms: 0,
            dwell_max_ms: 0,
            scroll_pause_ms: 0,
            click_pause_min_ms: 0,
            click_pause_max_ms: 0,
            post_interaction_ms: 0,
            pre_convert_ms: 0,
            ..Self::default()
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn post_ready(&self) -> Duration {
        Duration::from_millis(self.post_ready_ms)
    }

    /// A fresh random dwell time
    pub fn dwell(&self) -> Duration {
        between(self.dwell_min_ms, self.dwell_max_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    /// A fresh random click count
    pub fn click_count(&self) -> u32 {
        if self.max_clicks <= self.min_clicks {
            self.min_clicks
        } else {
            rand::random_range(self.min_clicks..=self.max_clicks)
        }
    }

    /// A fresh random pause between clicks
    pub fn click_pause(&self) -> Duration {
        between(self.click_pause_min_ms, self.click_pause_max_ms)
    }

    pub fn post_interaction(&self) -> Duration {
        Duration::from_millis(self.post_interaction_ms)
    }

    pub fn pre_convert(&self) -> Duration {
        Duration::from_millis(self.pre_convert_ms)
    }
}

fn between(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        Duration::from_millis(min_ms)
    } else {
        Duration::from_millis(rand::random_range(min_ms..=max_ms))
    }
}

/// Text-completion oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base_url: String,

    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub temperature: f32,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl OracleConfig {
    /// Reads the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(self.api_key_env.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Content converter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConverterConfig {
    /// Reader-service endpoint; `{url}` is replaced by the page URL
    pub endpoint: String,

    /// Request timeout (seconds), shared by the fallback fetch
    pub timeout_secs: u64,

    /// Maximum characters per extraction chunk
    pub chunk_size: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://r.jina.ai/{url}".to_string(),
            timeout_secs: 60,
            chunk_size: 12_000,
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policies per operation class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    pub navigation: RetryPolicy,
    pub conversion: RetryPolicy,
    pub classification: RetryPolicy,
    pub extraction: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            navigation: RetryPolicy::navigation(),
            conversion: RetryPolicy::conversion(),
            classification: RetryPolicy::classification(),
            extraction: RetryPolicy::extraction(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Where postings are written as CSV; JSON lines on stdout when unset
    pub csv_path: Option<String>,

    /// Where the markdown crawl report is written
    pub report_path: Option<String>,
}
