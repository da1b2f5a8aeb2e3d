use crate::UrlError;
use url::Url;

/// Normalizes a URL for crawling
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS (`mailto:`, `javascript:`, ...)
/// 3. Reject URLs without a host
/// 4. Remove fragment (everything after #)
///
/// Nothing else is rewritten: careers sites routinely encode job ids in the
/// query string, so query parameters and trailing slashes are kept as-is.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use job_scout::url::normalize_url;
///
/// let url = normalize_url("https://example.com/careers#open-roles").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/careers");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Strips the fragment from a URL string without validating it
///
/// Parseable URLs are re-serialized so that `https://example.com` and
/// `https://example.com/#top` collapse to the same key. Anything that does not
/// parse is cut at the first `#`.
///
/// # Examples
///
/// ```
/// use job_scout::url::strip_fragment;
///
/// assert_eq!(
///     strip_fragment("https://example.com/jobs#apply"),
///     strip_fragment("https://example.com/jobs")
/// );
/// ```
pub fn strip_fragment(url_str: &str) -> String {
    let trimmed = url_str.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => match trimmed.split_once('#') {
            Some((before, _)) => before.to_string(),
            None => trimmed.to_string(),
        },
    }
}
