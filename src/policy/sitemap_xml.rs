//! Sitemap XML parsing and enumeration
//!
//! Handles both `<urlset>` documents and `<sitemapindex>` documents whose
//! children are fetched one by one. A failing child is skipped; only a failure
//! of the root document is reported to the caller.

use crate::crawler::{Fetcher, RateScheduler};
use crate::FetchError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// How many index levels are followed below the root sitemap
const MAX_INDEX_DEPTH: usize = 2;

/// Errors that can occur while reading a sitemap
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Failed to fetch sitemap: {0}")]
    Fetch(#[from] FetchError),

    #[error("Malformed sitemap XML: {0}")]
    Xml(String),
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
}

/// Parses a sitemap or sitemap index
///
/// Every `<loc>` value is collected in document order, trimmed, with entity
/// and character references resolved.
///
/// # Example
///
/// ```
/// use article_sieve::policy::{parse_sitemap, SitemapDocument};
///
/// let xml = r#"<urlset><url><loc>https://example.com/a?x=1&amp;y=2</loc></url></urlset>"#;
/// assert_eq!(
///     parse_sitemap(xml).unwrap(),
///     SitemapDocument::UrlSet(vec!["https://example.com/a?x=1&y=2".to_string()])
/// );
/// ```
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);

    let mut is_index: Option<bool> = None;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locations = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" if is_index.is_none() => is_index = Some(true),
                b"urlset" if is_index.is_none() => is_index = Some(false),
                b"loc" => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" && in_loc {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locations.push(loc.to_string());
                    }
                }
            }
            Ok(Event::Text(t)) if in_loc => current.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::CData(c)) if in_loc => current.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::GeneralRef(r)) if in_loc => {
                let name = String::from_utf8_lossy(&r).into_owned();
                match resolve_reference(&name) {
                    Some(c) => current.push(c),
                    None => {
                        return Err(SitemapError::Xml(format!(
                            "unknown entity reference '&{};'",
                            name
                        )))
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SitemapError::Xml(e.to_string())),
        }
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(locations)),
        Some(false) => Ok(SitemapDocument::UrlSet(locations)),
        None => Err(SitemapError::Xml(
            "expected <urlset> or <sitemapindex> root element".to_string(),
        )),
    }
}

/// Resolves a predefined XML entity or a numeric character reference
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Enumerates every page URL reachable from a sitemap
///
/// All requests go through the rate scheduler. Index children are followed up
/// to two levels deep and each sitemap URL is fetched at most once.
///
/// # Errors
///
/// Fails only when the root sitemap cannot be fetched or parsed. Child
/// failures are logged and skipped.
pub async fn collect_sitemap_urls(
    sitemap_url: &str,
    fetcher: &dyn Fetcher,
    scheduler: &RateScheduler,
) -> Result<Vec<String>, SitemapError> {
    let mut pending = VecDeque::from([(sitemap_url.to_string(), 0usize)]);
    let mut seen = HashSet::from([sitemap_url.to_string()]);
    let mut urls = Vec::new();

    while let Some((url, depth)) = pending.pop_front() {
        let document = match fetch_sitemap(&url, fetcher, scheduler).await {
            Ok(document) => document,
            Err(e) if depth == 0 => return Err(e),
            Err(e) => {
                tracing::warn!("Skipping child sitemap {}: {}", url, e);
                continue;
            }
        };

        match document {
            SitemapDocument::UrlSet(locations) => {
                tracing::info!("Collected {} URLs from {}", locations.len(), url);
                urls.extend(locations);
            }
            SitemapDocument::Index(children) => {
                tracing::info!("Found {} nested sitemaps in {}", children.len(), url);
                if depth >= MAX_INDEX_DEPTH {
                    tracing::warn!(
                        "Sitemap index {} is nested too deeply, ignoring its children",
                        url
                    );
                    continue;
                }
                for child in children {
                    if seen.insert(child.clone()) {
                        pending.push_back((child, depth + 1));
                    }
                }
            }
        }
    }

    tracing::info!("Total URLs collected from {}: {}", sitemap_url, urls.len());
    Ok(urls)
}

async fn fetch_sitemap(
    url: &str,
    fetcher: &dyn Fetcher,
    scheduler: &RateScheduler,
) -> Result<SitemapDocument, SitemapError> {
    tracing::debug!("Fetching sitemap {}", url);
    let body = scheduler.schedule(|| fetcher.fetch(url)).await?;
    parse_sitemap(&body)
}
