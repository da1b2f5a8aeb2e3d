use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use job_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `candidate` lives on the same site as `site`
///
/// Two URLs are on the same site when their hosts match case-insensitively and
/// their effective ports agree. Subdomains count as different sites.
pub fn is_same_site(candidate: &Url, site: &Url) -> bool {
    match (extract_domain(candidate), extract_domain(site)) {
        (Some(a), Some(b)) => a == b && candidate.port_or_known_default() == site.port_or_known_default(),
        _ => false,
    }
}
