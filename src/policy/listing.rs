//! Listing-crawl policy
//!
//! Starts at a root listing page and follows links that stay below the root
//! path. A page is an article when it sits deep enough below the root and
//! carries one of the configured article markers.

use super::extract::{compile_selector, compile_selectors, extract_article, ExtractionRules};
use super::links::extract_links;
use super::{ExtractedArticle, SitePolicy, Traversal};
use crate::config::ListingSiteConfig;
use crate::crawler::{Fetcher, RateScheduler};
use crate::url::{extract_host, host_matches, normalize, path_segments, site_origin};
use crate::ConfigError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

#[derive(Debug)]
pub struct ListingPolicy {
    id: String,
    root_url: String,
    origin: String,
    scheme: String,
    host: String,

    /// Lowercased root path segments
    root_segments: Vec<String>,

    card: Option<Selector>,
    markers: Vec<Selector>,
    blocked_paths: Vec<String>,
    tracking_params: Vec<String>,
    min_article_depth: usize,
    rules: ExtractionRules,
}

impl ListingPolicy {
    /// Builds the policy, compiling every selector up front
    pub fn from_config(config: &ListingSiteConfig) -> Result<Self, ConfigError> {
        let invalid_url = |e: crate::UrlError| {
            ConfigError::InvalidUrl(format!("site '{}': {}: {}", config.id, config.root_url, e))
        };
        let origin = site_origin(&config.root_url).map_err(invalid_url)?;

        // Compare against the root in its normalized (lowercased) form
        let root = Url::parse(normalize(&config.root_url).as_str())
            .map_err(|e| invalid_url(crate::UrlError::Parse(e.to_string())))?;
        let host = extract_host(&root).ok_or_else(|| invalid_url(crate::UrlError::MissingDomain))?;

        let card = config
            .card_selector
            .as_deref()
            .map(|s| compile_selector(&config.id, s))
            .transpose()?;

        Ok(Self {
            id: config.id.clone(),
            root_url: config.root_url.clone(),
            origin,
            scheme: root.scheme().to_string(),
            host,
            root_segments: path_segments(&root),
            card,
            markers: compile_selectors(&config.id, &config.article_markers)?,
            blocked_paths: config
                .blocked_paths
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            tracking_params: config.tracking_params.clone(),
            min_article_depth: config.min_article_depth,
            rules: ExtractionRules::from_config(&config.id, &config.extract)?,
        })
    }

    /// Path segments of `url` below the root, or None if it is not under the root
    fn segments_below_root(&self, url: &Url) -> Option<Vec<String>> {
        let segments: Vec<String> = path_segments(url)
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect();

        if segments.len() < self.root_segments.len()
            || segments[..self.root_segments.len()] != self.root_segments[..]
        {
            return None;
        }

        Some(segments[self.root_segments.len()..].to_vec())
    }

    fn has_marker(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        self.markers
            .iter()
            .any(|marker| document.select(marker).next().is_some())
    }
}

#[async_trait]
impl SitePolicy for ListingPolicy {
    fn id(&self) -> &str {
        &self.id
    }

    fn traversal(&self) -> Traversal {
        Traversal::Listing
    }

    fn domain(&self) -> &str {
        &self.origin
    }

    fn main_url(&self) -> String {
        self.root_url.clone()
    }

    fn section_url(&self, article_url: &str) -> Option<String> {
        let url = Url::parse(article_url).ok()?;
        let below = self.segments_below_root(&url)?;

        if below.len() < 2 {
            return Some(self.root_url.clone());
        }

        let parent = path_segments(&url);
        Some(format!(
            "{}/{}",
            self.origin,
            parent[..parent.len() - 1].join("/")
        ))
    }

    async fn seed_urls(&self, _fetcher: &dyn Fetcher, _scheduler: &RateScheduler) -> Vec<String> {
        vec![self.root_url.clone()]
    }

    fn discover_links(&self, html: &str, base_url: &str) -> Vec<String> {
        match Url::parse(base_url) {
            Ok(base) => extract_links(html, &base, self.card.as_ref()),
            Err(e) => {
                tracing::debug!("Cannot resolve links against {}: {}", base_url, e);
                Vec::new()
            }
        }
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

        if self.segments_below_root(&parsed).is_none() {
            return false;
        }

        let path = parsed.path().to_lowercase();
        if self.blocked_paths.iter().any(|blocked| path.contains(blocked)) {
            return false;
        }

        !parsed.query_pairs().any(|(key, _)| {
            self.tracking_params
                .iter()
                .any(|param| param.eq_ignore_ascii_case(&key))
        })
    }

    fn is_article_url(&self, url: &str, html: &str) -> bool {
        let deep_enough = Url::parse(url)
            .ok()
            .and_then(|parsed| self.segments_below_root(&parsed))
            .is_some_and(|below| below.len() >= self.min_article_depth);

        deep_enough && self.has_marker(html)
    }

    fn extract_article(&self, html: &str) -> ExtractedArticle {
        extract_article(html, &self.rules)
    }
}
