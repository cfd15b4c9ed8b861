//! Site traversal policies
//!
//! A policy captures everything that differs between crawl targets: where
//! crawling starts, which URLs belong to the site, how links are discovered,
//! which pages are articles and how an article is read out of a page. The
//! crawl loop only talks to the [`SitePolicy`] trait.

mod extract;
mod links;
mod listing;
mod sitemap;
mod sitemap_xml;

pub use extract::{collapse_whitespace, extract_article, ExtractedArticle, ExtractionRules};
pub use links::{extract_links, resolve_link};
pub use listing::ListingPolicy;
pub use sitemap::SitemapPolicy;
pub use sitemap_xml::{collect_sitemap_urls, parse_sitemap, SitemapDocument, SitemapError};

use crate::config::SiteConfig;
use crate::crawler::{Fetcher, RateScheduler};
use crate::ConfigError;
use async_trait::async_trait;
use std::fmt;

/// How a site's pages are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Follow links from listing pages
    Listing,
    /// Enumerate a sitemap up front
    Sitemap,
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Sitemap => write!(f, "sitemap"),
        }
    }
}

/// Per-site crawl behavior
#[async_trait]
pub trait SitePolicy: Send + Sync {
    /// Site identifier, also the checkpoint owner key
    fn id(&self) -> &str;

    fn traversal(&self) -> Traversal;

    /// Origin whose robots.txt governs the site
    fn domain(&self) -> &str;

    /// Value of the record's `mainUrl`
    fn main_url(&self) -> String;

    /// Value of the record's `sectionUrl` for an article
    fn section_url(&self, article_url: &str) -> Option<String>;

    /// URLs the frontier starts from on a fresh crawl
    ///
    /// Never fails: an unreachable source yields no seeds.
    async fn seed_urls(&self, fetcher: &dyn Fetcher, scheduler: &RateScheduler) -> Vec<String>;

    /// Links found on a fetched page, absolute and unfiltered
    fn discover_links(&self, html: &str, base_url: &str) -> Vec<String>;

    fn is_in_scope_url(&self, url: &str) -> bool;

    /// Whether a fetched page should go through article extraction
    fn is_article_url(&self, url: &str, html: &str) -> bool;

    fn extract_article(&self, html: &str) -> ExtractedArticle;
}

/// Builds the policy for a configured site
///
/// # Errors
///
/// Returns a `ConfigError` when a URL or selector of the site is unusable.
pub fn build_policy(site: &SiteConfig) -> Result<Box<dyn SitePolicy>, ConfigError> {
    Ok(match site {
        SiteConfig::Listing(config) => Box::new(ListingPolicy::from_config(config)?),
        SiteConfig::Sitemap(config) => Box::new(SitemapPolicy::from_config(config)?),
    })
}
