//! HTTP plumbing shared by the reader client and the HTML fallback

use super::ConvertError;
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    /// Content-Type header value, empty if absent
    pub content_type: String,
    pub body: String,
}

impl FetchedPage {
    /// True if the server labelled the body as HTML (or did not label it)
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty() || self.content_type.contains("html")
    }
}

/// Builds an HTTP client
///
/// # Arguments
///
/// * `user_agent` - User agent string sent with every request; empty for the reqwest default
/// * `timeout` - Total request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .gzip(true)
        .brotli(true);

    if !user_agent.is_empty() {
        builder = builder.user_agent(user_agent);
    }

    builder.build()
}

/// Fetches `url` with a plain GET
///
/// # Returns
///
/// * `Ok(FetchedPage)` - 2xx response with its body
/// * `Err(ConvertError::Status)` - Non-success status
/// * `Err(ConvertError::Http)` - Transport failure
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, ConvertError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return Err(ConvertError::Status {
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    })
}
