//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate (a port of
//! Google's matcher). `Crawl-delay` is not part of that matcher, so it is read
//! with a small group-aware line scanner.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// Permissive policy installed when robots.txt is unavailable
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows every URL
    ///
    /// Used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this is the permissive fallback policy
    pub fn is_permissive(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL (or path) to check
    /// * `user_agent` - Product token of the crawler, e.g. `ArticleSieve`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the `Crawl-delay` that applies to a user agent
    ///
    /// A group naming the agent wins over the `*` group. Agent names are
    /// compared case-insensitively.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The delay declared for the agent or for `*`
    /// * `None` - No applicable, parseable `Crawl-delay`, or a value too large
    ///   to represent as a `Duration`
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group
                    if group_open {
                        group.clear();
                        group_open = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = true;
                    let Ok(seconds) = value.parse::<f64>() else {
                        continue;
                    };
                    if !seconds.is_finite() || seconds < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| ua == &agent) {
                        for_agent = Some(seconds);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard = Some(seconds);
                    }
                }
                _ => group_open = true,
            }
        }

        for_agent
            .or(for_wildcard)
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}
