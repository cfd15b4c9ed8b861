/// Checks whether a candidate host is a site's host
///
/// A leading `www.` is ignored on both sides and case is ignored. Other
/// subdomains do not match.
///
/// # Arguments
///
/// * `site_host` - The host the site is configured with
/// * `candidate` - The host of a discovered URL
///
/// # Examples
///
/// ```
/// use article_sieve::url::host_matches;
///
/// assert!(host_matches("example.com", "example.com"));
/// assert!(host_matches("example.com", "www.example.com"));
/// assert!(!host_matches("www.example.com", "blog.example.com"));
/// assert!(!host_matches("example.com", "example.org"));
/// ```
pub fn host_matches(site_host: &str, candidate: &str) -> bool {
    strip_www(candidate).eq_ignore_ascii_case(strip_www(site_host))
}

fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    }
}
