use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, ListingSiteConfig, OutputConfig, SiteConfig,
    SitemapSiteConfig, UserAgentConfig,
};
use crate::url::site_origin;
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 16 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 16, got {}",
            config.max_concurrent
        )));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.max_articles_per_site < 1 {
        return Err(ConfigError::Validation(format!(
            "max-articles-per-site must be >= 1, got {}",
            config.max_articles_per_site
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_crawl_delay_secs < 1 || config.max_crawl_delay_secs > 3600 {
        return Err(ConfigError::Validation(format!(
            "max-crawl-delay-secs must be between 1 and 3600, got {}",
            config.max_crawl_delay_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only ASCII letters, digits, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.articles_path.is_empty() {
        return Err(ConfigError::Validation(
            "articles-path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty".to_string(),
        ));
    }

    if config.articles_path == config.checkpoint_path {
        return Err(ConfigError::Validation(
            "articles-path and checkpoint-path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries and their uniqueness
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        validate_site_id(site.id())?;

        if !seen.insert(site.id()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site id '{}'",
                site.id()
            )));
        }

        match site {
            SiteConfig::Listing(listing) => validate_listing_site(listing)?,
            SiteConfig::Sitemap(sitemap) => validate_sitemap_site(sitemap)?,
        }

        validate_extraction(site.id(), site.extract())?;
    }

    Ok(())
}

fn validate_site_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "site id cannot be empty".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "site id '{}' must contain only ASCII letters, digits, '-' and '_'",
            id
        )));
    }

    Ok(())
}

fn validate_listing_site(site: &ListingSiteConfig) -> Result<(), ConfigError> {
    validate_site_url(&site.id, "root-url", &site.root_url)?;

    if let Some(card) = &site.card_selector {
        validate_selector(&site.id, card)?;
    }

    if site.article_markers.is_empty() {
        return Err(ConfigError::Validation(format!(
            "site '{}' needs at least one article marker",
            site.id
        )));
    }

    for marker in &site.article_markers {
        validate_selector(&site.id, marker)?;
    }

    // Depth 0 would let the root listing page itself count as an article
    if site.min_article_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "site '{}': min-article-depth must be >= 1, got {}",
            site.id, site.min_article_depth
        )));
    }

    Ok(())
}

fn validate_sitemap_site(site: &SitemapSiteConfig) -> Result<(), ConfigError> {
    validate_site_url(&site.id, "base-url", &site.base_url)?;
    validate_site_url(&site.id, "sitemap-url", &site.sitemap_url)?;

    for prefix in &site.excluded_prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "site '{}': excluded prefix '{}' must start with '/'",
                site.id, prefix
            )));
        }
    }

    Ok(())
}

fn validate_extraction(site_id: &str, extract: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_selector(site_id, &extract.title_selector)?;

    if extract.content_selectors.is_empty() {
        return Err(ConfigError::Validation(format!(
            "site '{}' needs at least one content selector",
            site_id
        )));
    }

    for selector in extract
        .content_selectors
        .iter()
        .chain(extract.noise_selectors.iter())
    {
        validate_selector(site_id, selector)?;
    }

    Ok(())
}

/// Checks that a site URL is absolute HTTP(S) with a host
fn validate_site_url(site_id: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    site_origin(value).map(|_| ()).map_err(|e| {
        ConfigError::InvalidUrl(format!("site '{}': {} '{}': {}", site_id, field, value, e))
    })
}

/// Checks that a CSS selector parses
fn validate_selector(site_id: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            site: site_id.to_string(),
            selector: selector.to_string(),
        })
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
