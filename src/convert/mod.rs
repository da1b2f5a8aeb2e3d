//! Content converter: page URL -> text
//!
//! The primary path asks a reader service for a rendered markdown version of
//! the page, under the conversion retry policy. If that fails, or the
//! service answers with error content, the page is fetched directly and its
//! HTML converted locally. The converter never fails outward: on total
//! failure it returns an error-marker string.

mod fallback;
mod fetcher;
mod reader;

pub use fallback::{html_to_text, tag_line, HtmlFallback};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use reader::{parse_event_stream, ReaderClient};

use crate::config::ConverterConfig;
use crate::retry::{RetryError, RetryPolicy};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Prefix of content that signals a failed conversion
pub const ERROR_MARKER: &str = "Error";

/// Errors raised inside the converter
///
/// These never leave `ContentConverter::convert`; they decide between
/// retrying, falling back, and the error-marker result.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("service returned error content: {0}")]
    ErrorContent(String),

    #[error("empty content")]
    Empty,

    #[error("cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Transport failures and non-success statuses are retried; error content
    /// and empty bodies go straight to the fallback
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

/// True if `text` is (or starts like) a conversion error
pub fn is_error_marker(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_MARKER)
}

/// The converter's result on total failure
pub fn error_marker(url: &str, reason: &str) -> String {
    format!("{} converting {}: {}", ERROR_MARKER, url, reason)
}

/// Converts a page URL to text
#[async_trait]
pub trait PageConverter: Send + Sync {
    /// Always returns a string; failures yield an error-marker string
    async fn convert(&self, url: &str, cancel: &CancellationToken) -> String;
}

/// Reader service first, local HTML extraction second
pub struct ContentConverter {
    reader: ReaderClient,
    fallback: HtmlFallback,
    policy: RetryPolicy,
}

impl ContentConverter {
    pub fn new(reader: ReaderClient, fallback: HtmlFallback, policy: RetryPolicy) -> Self {
        Self {
            reader,
            fallback,
            policy,
        }
    }

    /// Builds a converter from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Reader endpoint and timeouts
    /// * `user_agent` - User agent for direct page fetches
    /// * `policy` - Retry policy for the reader service
    pub fn from_config(
        config: &ConverterConfig,
        user_agent: &str,
        policy: RetryPolicy,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(
            ReaderClient::new(config.endpoint.clone(), config.timeout())?,
            HtmlFallback::new(user_agent, config.timeout())?,
            policy,
        ))
    }
}

#[async_trait]
impl PageConverter for ContentConverter {
    async fn convert(&self, url: &str, cancel: &CancellationToken) -> String {
        let reader = &self.reader;
        let primary = self
            .policy
            .run("convert page", cancel, ConvertError::is_retryable, move |_| {
                reader.read(url)
            })
            .await;

        let reason = match primary {
            Ok(text) => return text,
            Err(RetryError::Cancelled) => return error_marker(url, &ConvertError::Cancelled.to_string()),
            Err(RetryError::Exhausted { last, .. }) | Err(RetryError::Rejected(last)) => last,
        };

        tracing::warn!(
            "Reader conversion of {} failed ({}); falling back to local HTML extraction",
            url,
            reason
        );

        let fallback = tokio::select! {
            _ = cancel.cancelled() => Err(ConvertError::Cancelled),
            result = self.fallback.convert(url) => result,
        };

        match fallback {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Fallback conversion of {} failed: {}", url, e);
                error_marker(url, &format!("{}; fallback: {}", reason, e))
            }
        }
    }
}
