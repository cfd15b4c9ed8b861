//! Robots.txt caching implementation
//!
//! Policies are cached per site origin and refreshed once they are older than
//! 24 hours, so a long-running service picks up changes made by site owners.

use crate::crawler::{Fetcher, RateScheduler};
use crate::robots::{robots_url, ParsedRobots};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Cached robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps a parsed policy, stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached policy is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Per-origin robots.txt policy cache
///
/// A site without a cached policy is treated as fully allowed.
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches and caches robots.txt for an origin unless a fresh copy exists
    ///
    /// The request goes through the rate scheduler like any page fetch. If it
    /// fails for any reason (network, 404, 5xx) a permissive policy is
    /// installed and crawling continues with degraded compliance.
    ///
    /// # Arguments
    ///
    /// * `domain` - Site origin, e.g. `https://example.com`
    /// * `fetcher` - Transport used for the request
    /// * `scheduler` - Global pacing token
    pub async fn initialize(
        &mut self,
        domain: &str,
        fetcher: &dyn Fetcher,
        scheduler: &RateScheduler,
    ) {
        if let Some(cached) = self.entries.get(domain) {
            if !cached.is_stale() {
                tracing::debug!("Using cached robots.txt for {}", domain);
                return;
            }
            tracing::debug!("Cached robots.txt for {} is stale, refetching", domain);
        }

        let url = robots_url(domain);
        let robots = match scheduler.schedule(|| fetcher.fetch(&url)).await {
            Ok(body) => {
                tracing::info!("Loaded robots.txt for {}", domain);
                ParsedRobots::from_content(&body)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load {} ({}); allowing all URLs on {} (robots compliance degraded)",
                    url,
                    e,
                    domain
                );
                ParsedRobots::allow_all()
            }
        };

        self.entries
            .insert(domain.to_string(), CachedRobots::new(robots));
    }

    /// Installs a policy directly, replacing any cached entry
    pub fn insert(&mut self, domain: &str, robots: ParsedRobots) {
        self.entries
            .insert(domain.to_string(), CachedRobots::new(robots));
    }

    /// Checks whether a URL may be fetched
    ///
    /// Returns true when no policy is cached for the origin.
    pub fn is_allowed(&self, url: &str, domain: &str, user_agent: &str) -> bool {
        match self.entries.get(domain) {
            Some(cached) => cached.content.is_allowed(url, user_agent),
            None => {
                tracing::debug!("No robots.txt cached for {}, allowing {}", domain, url);
                true
            }
        }
    }

    /// Returns the `Crawl-delay` declared for the agent on an origin
    pub fn crawl_delay(&self, domain: &str, user_agent: &str) -> Option<std::time::Duration> {
        self.entries
            .get(domain)
            .and_then(|cached| cached.content.crawl_delay(user_agent))
    }

    /// Returns the cached entry for an origin
    pub fn get(&self, domain: &str) -> Option<&CachedRobots> {
        self.entries.get(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct StaticFetcher {
        body: Option<String>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(body: Option<&str>) -> Self {
            Self {
                body: body.map(|b| b.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(body.clone()),
                None => Err(FetchError::Network {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn scheduler() -> RateScheduler {
        RateScheduler::new(StdDuration::ZERO, 1)
    }

    #[test]
    fn test_new_cache_entry_not_stale() {
        let cached = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cached.is_stale());
    }

    #[test]
    fn test_cache_entry_stale_after_a_day() {
        let mut cached = CachedRobots::new(ParsedRobots::allow_all());
        cached.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cached.is_stale());

        cached.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cached.is_stale());
    }

    #[test]
    fn test_unknown_domain_is_allowed() {
        let cache = RobotsCache::new();
        assert!(cache.is_allowed("https://example.com/x", "https://example.com", "Bot"));
    }

    #[tokio::test]
    async fn test_initialize_applies_rules() {
        let fetcher = StaticFetcher::new(Some("User-agent: *\nDisallow: /private"));
        let mut cache = RobotsCache::new();
        cache
            .initialize("https://example.com", &fetcher, &scheduler())
            .await;

        assert!(cache.is_allowed("https://example.com/news", "https://example.com", "Bot"));
        assert!(!cache.is_allowed(
            "https://example.com/private/a",
            "https://example.com",
            "Bot"
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_installs_allow_all() {
        let fetcher = StaticFetcher::new(None);
        let mut cache = RobotsCache::new();
        cache
            .initialize("https://example.com", &fetcher, &scheduler())
            .await;

        let cached = cache.get("https://example.com").unwrap();
        assert!(cached.content.is_permissive());
        assert!(cache.is_allowed("https://example.com/anything", "https://example.com", "Bot"));
    }

    #[tokio::test]
    async fn test_fresh_entry_not_refetched() {
        let fetcher = StaticFetcher::new(Some("User-agent: *\nAllow: /"));
        let mut cache = RobotsCache::new();
        let scheduler = scheduler();

        cache.initialize("https://example.com", &fetcher, &scheduler).await;
        cache.initialize("https://example.com", &fetcher, &scheduler).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_crawl_delay_lookup() {
        let fetcher = StaticFetcher::new(Some("User-agent: *\nCrawl-delay: 2"));
        let mut cache = RobotsCache::new();
        cache
            .initialize("https://example.com", &fetcher, &scheduler())
            .await;

        assert_eq!(
            cache.crawl_delay("https://example.com", "Bot"),
            Some(StdDuration::from_secs(2))
        );
        assert_eq!(cache.crawl_delay("https://other.com", "Bot"), None);
    }
}
