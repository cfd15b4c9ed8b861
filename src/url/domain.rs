use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use article_sieve::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the origin (`scheme://host[:port]`) of an HTTP(S) URL string
///
/// The origin is the key under which robots.txt policies are cached.
///
/// # Arguments
///
/// * `url_str` - An absolute HTTP or HTTPS URL
///
/// # Returns
///
/// * `Ok(String)` - The origin without a trailing slash
/// * `Err(UrlError)` - The URL is malformed, not HTTP(S), or has no host
pub fn site_origin(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url.origin().ascii_serialization())
}

/// Splits a URL path into its non-empty segments
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
