//! Sitemap-driven policy
//!
//! The frontier is seeded from the site's sitemap; fetched pages are never
//! mined for links. Every in-scope URL is treated as an article candidate and
//! extraction decides whether it yields a record.

use super::extract::{extract_article, ExtractionRules};
use super::sitemap_xml::collect_sitemap_urls;
use super::{ExtractedArticle, SitePolicy, Traversal};
use crate::config::SitemapSiteConfig;
use crate::crawler::{Fetcher, RateScheduler};
use crate::url::{extract_host, host_matches, path_segments, site_origin};
use crate::ConfigError;
use async_trait::async_trait;
use url::Url;

#[derive(Debug)]
pub struct SitemapPolicy {
    id: String,
    base_url: String,
    origin: String,
    scheme: String,
    host: String,
    sitemap_url: String,
    excluded_prefixes: Vec<String>,
    section_categories: Vec<String>,
    rules: ExtractionRules,
}

impl SitemapPolicy {
    pub fn from_config(config: &SitemapSiteConfig) -> Result<Self, ConfigError> {
        let origin = site_origin(&config.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("site '{}': {}: {}", config.id, config.base_url, e))
        })?;
        let no_host =
            || ConfigError::InvalidUrl(format!("site '{}': no host in {}", config.id, origin));
        let parsed = Url::parse(&origin).map_err(|_| no_host())?;
        let host = extract_host(&parsed).ok_or_else(no_host)?;
        let scheme = parsed.scheme().to_string();

        Ok(Self {
            id: config.id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            origin,
            scheme,
            host,
            sitemap_url: config.sitemap_url.clone(),
            excluded_prefixes: config
                .excluded_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            section_categories: config
                .section_categories
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            rules: ExtractionRules::from_config(&config.id, &config.extract)?,
        })
    }
}

#[async_trait]
impl SitePolicy for SitemapPolicy {
    fn id(&self) -> &str {
        &self.id
    }

    fn traversal(&self) -> Traversal {
        Traversal::Sitemap
    }

    fn domain(&self) -> &str {
        &self.origin
    }

    fn main_url(&self) -> String {
        self.base_url.clone()
    }

    fn section_url(&self, article_url: &str) -> Option<String> {
        let url = Url::parse(article_url).ok()?;
        let segments = path_segments(&url);

        match segments.as_slice() {
            [category, _, ..] if self.section_categories.contains(&category.to_lowercase()) => {
                Some(format!("{}/{}", self.base_url, category))
            }
            _ => None,
        }
    }

    async fn seed_urls(&self, fetcher: &dyn Fetcher, scheduler: &RateScheduler) -> Vec<String> {
        match collect_sitemap_urls(&self.sitemap_url, fetcher, scheduler).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!(
                    "Failed to read sitemap {} for {}: {}",
                    self.sitemap_url,
                    self.id,
                    e
                );
                Vec::new()
            }
        }
    }

    fn discover_links(&self, _html: &str, _base_url: &str) -> Vec<String> {
        Vec::new()
    }

    fn is_in_scope_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if parsed.scheme() != self.scheme {
            return false;
        }

        match extract_host(&parsed) {
            Some(host) if host_matches(&self.host, &host) => {}
            _ => return false,
        }

        let path = parsed.path().to_lowercase();
        if path == "/" || path.ends_with('/') {
            return false;
        }

        !self
            .excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    fn is_article_url(&self, url: &str, _html: &str) -> bool {
        self.is_in_scope_url(url)
    }

    fn extract_article(&self, html: &str) -> ExtractedArticle {
        extract_article(html, &self.rules)
    }
}
