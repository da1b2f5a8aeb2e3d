//! Reader-service client
//!
//! The service renders a page and returns it as markdown. With
//! `Accept: text/event-stream` it streams progressively more complete
//! renderings; the last event holds the full page.

use super::fetcher::build_http_client;
use super::{is_error_marker, ConvertError};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Client for a templated reader endpoint such as `https://r.jina.ai/{url}`
#[derive(Debug, Clone)]
pub struct ReaderClient {
    client: Client,
    endpoint: String,
}

impl ReaderClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ConvertError> {
        Ok(Self {
            client: build_http_client("", timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// Substitutes `url` into the endpoint template
    pub fn request_url(&self, url: &str) -> String {
        self.endpoint.replace("{url}", url)
    }

    /// Converts `url` to markdown
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Non-empty markdown
    /// * `Err(ConvertError::Status)` / `Err(ConvertError::Http)` - Retryable failures
    /// * `Err(ConvertError::ErrorContent)` - The service answered with an error text
    /// * `Err(ConvertError::Empty)` - The service answered with nothing
    pub async fn read(&self, url: &str) -> Result<String, ConvertError> {
        let response = self
            .client
            .get(self.request_url(url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header("X-Respond-With", "markdown")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::Status {
                status: status.as_u16(),
            });
        }

        let streamed = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/event-stream"));
        let body = response.text().await?;

        let content = if streamed || looks_like_event_stream(&body) {
            parse_event_stream(&body)
        } else {
            body
        };

        let content = content.trim();
        if content.is_empty() {
            return Err(ConvertError::Empty);
        }
        if is_error_marker(content) {
            let first_line = content.lines().next().unwrap_or_default();
            return Err(ConvertError::ErrorContent(first_line.to_string()));
        }

        tracing::debug!("Reader converted {} ({} chars)", url, content.len());
        Ok(content.to_string())
    }
}

fn looks_like_event_stream(body: &str) -> bool {
    let start = body.trim_start();
    start.starts_with("data:") || start.starts_with("event:") || start.starts_with("id:")
}

/// Returns the payload of the last non-empty event in an event stream
///
/// Multi-line `data:` fields are joined with newlines. A JSON payload with a
/// string `content` field is unwrapped to that field.
pub fn parse_event_stream(body: &str) -> String {
    let mut last = String::new();
    let mut data: Vec<&str> = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            finish_event(&mut data, &mut last);
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    finish_event(&mut data, &mut last);

    match serde_json::from_str::<Value>(&last) {
        Ok(Value::Object(object)) => match object.get("content") {
            Some(Value::String(content)) => content.clone(),
            _ => last,
        },
        _ => last,
    }
}

fn finish_event(data: &mut Vec<&str>, last: &mut String) {
    if data.is_empty() {
        return;
    }
    let payload = data.join("\n");
    if !payload.trim().is_empty() {
        *last = payload;
    }
    data.clear();
}
