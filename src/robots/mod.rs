//! Robots.txt handling module
//!
//! This module provides fetching, parsing, and caching of robots.txt policies,
//! one per site origin.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

/// Builds the robots.txt URL for a site origin
///
/// # Examples
///
/// ```
/// use article_sieve::robots::robots_url;
///
/// assert_eq!(robots_url("https://example.com/"), "https://example.com/robots.txt");
/// assert_eq!(robots_url("https://example.com"), "https://example.com/robots.txt");
/// ```
pub fn robots_url(domain: &str) -> String {
    format!("{}/robots.txt", domain.trim_end_matches('/'))
}
