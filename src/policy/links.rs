//! Anchor extraction for link discovery
//!
//! Links are taken from `<a href>` elements, optionally restricted to a
//! container selector. Relative hrefs resolve against the page URL.
//!
//! **Skipped:**
//! - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
//! - fragment-only hrefs (same page anchors)
//! - `<a download>` anchors
//! - anything that is not HTTP(S) after resolution
//!
//! `rel="nofollow"` links are followed.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts absolute link targets from a page
///
/// When `container` is given, only anchors inside matching elements are
/// considered; if that yields nothing the whole document is scanned instead.
/// Duplicates are kept; the frontier deduplicates.
///
/// # Example
///
/// ```
/// use article_sieve::policy::extract_links;
/// use url::Url;
///
/// let html = r#"<div class="cards"><a href="/a">A</a></div><a href="/b">B</a>"#;
/// let base = Url::parse("https://example.com/list").unwrap();
/// let cards = scraper::Selector::parse(".cards").unwrap();
///
/// assert_eq!(extract_links(html, &base, Some(&cards)), vec!["https://example.com/a"]);
/// assert_eq!(extract_links(html, &base, None).len(), 2);
/// ```
pub fn extract_links(html: &str, base_url: &Url, container: Option<&Selector>) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    if let Some(container) = container {
        let links: Vec<String> = document
            .select(container)
            .flat_map(|scope| scope.select(&anchor))
            .filter_map(|element| anchor_target(element, base_url))
            .collect();

        if !links.is_empty() {
            return links;
        }

        tracing::debug!("No card links on {}, scanning all anchors", base_url);
    }

    document
        .select(&anchor)
        .filter_map(|element| anchor_target(element, base_url))
        .collect()
}

fn anchor_target(element: ElementRef<'_>, base_url: &Url) -> Option<String> {
    if element.value().attr("download").is_some() {
        return None;
    }

    element
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
