use serde::Deserialize;

/// Main configuration structure for Article-Sieve
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between two request starts (milliseconds)
    #[serde(rename = "min-interval-ms", default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Maximum number of requests in flight
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Save a checkpoint after every N emitted articles
    #[serde(rename = "checkpoint-every", default = "default_checkpoint_every")]
    pub checkpoint_every: u64,

    /// Stop a site once this many articles have been emitted for it
    #[serde(
        rename = "max-articles-per-site",
        default = "default_max_articles_per_site"
    )]
    pub max_articles_per_site: u64,

    /// Total timeout for a single request (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Retries for transient fetch failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds), doubled per retry
    #[serde(
        rename = "retry-base-delay-ms",
        default = "default_retry_base_delay_ms"
    )]
    pub retry_base_delay_ms: u64,

    /// Raise the request interval to a site's robots.txt Crawl-delay
    #[serde(rename = "respect-crawl-delay", default = "default_true")]
    pub respect_crawl_delay: bool,

    /// Upper bound applied to a robots.txt Crawl-delay (seconds)
    #[serde(
        rename = "max-crawl-delay-secs",
        default = "default_max_crawl_delay_secs"
    )]
    pub max_crawl_delay_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_concurrent: default_max_concurrent(),
            checkpoint_every: default_checkpoint_every(),
            max_articles_per_site: default_max_articles_per_site(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            respect_crawl_delay: true,
            max_crawl_delay_secs: default_max_crawl_delay_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where article records are written
    #[serde(rename = "articles-path", default = "default_articles_path")]
    pub articles_path: String,

    /// Record sink format
    #[serde(default)]
    pub format: OutputFormat,

    /// Checkpoint file location
    #[serde(rename = "checkpoint-path", default = "default_checkpoint_path")]
    pub checkpoint_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            articles_path: default_articles_path(),
            format: OutputFormat::default(),
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

/// Supported article sink formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// SQLite `articles` table
    Sqlite,
    /// Comma-separated values with a header row
    Csv,
}

/// Service mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Pause between two full crawls (seconds)
    #[serde(rename = "interval-secs", default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// One crawl target, tagged by traversal kind
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SiteConfig {
    /// Follow links from listing pages under a root URL
    Listing(ListingSiteConfig),
    /// Visit every URL enumerated by a sitemap
    Sitemap(SitemapSiteConfig),
}

impl SiteConfig {
    /// Returns the site identifier
    pub fn id(&self) -> &str {
        match self {
            Self::Listing(site) => &site.id,
            Self::Sitemap(site) => &site.id,
        }
    }

    /// Returns the traversal kind as written in the config
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Listing(_) => "listing",
            Self::Sitemap(_) => "sitemap",
        }
    }

    /// Returns the URL crawling starts from
    pub fn entry_url(&self) -> &str {
        match self {
            Self::Listing(site) => &site.root_url,
            Self::Sitemap(site) => &site.sitemap_url,
        }
    }

    /// Returns the extraction selectors
    pub fn extract(&self) -> &ExtractionConfig {
        match self {
            Self::Listing(site) => &site.extract,
            Self::Sitemap(site) => &site.extract,
        }
    }
}

/// Listing-crawl site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListingSiteConfig {
    /// Unique site identifier
    pub id: String,

    /// Root listing URL; only URLs below its path are in scope
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Container holding article cards; links are taken from inside it
    #[serde(rename = "card-selector", default)]
    pub card_selector: Option<String>,

    /// Elements whose presence marks a page as an article
    #[serde(rename = "article-markers", default = "default_article_markers")]
    pub article_markers: Vec<String>,

    /// Path fragments that put a URL out of scope
    #[serde(rename = "blocked-paths", default)]
    pub blocked_paths: Vec<String>,

    /// Query parameters that put a URL out of scope
    #[serde(rename = "tracking-params", default)]
    pub tracking_params: Vec<String>,

    /// Path segments below the root an article URL needs at least
    #[serde(rename = "min-article-depth", default = "default_min_article_depth")]
    pub min_article_depth: usize,

    #[serde(default)]
    pub extract: ExtractionConfig,
}

/// Sitemap-driven site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SitemapSiteConfig {
    /// Unique site identifier
    pub id: String,

    /// Site base URL, used as the record's main URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sitemap or sitemap index URL
    #[serde(rename = "sitemap-url")]
    pub sitemap_url: String,

    /// Path prefixes that never hold articles
    #[serde(rename = "excluded-prefixes", default)]
    pub excluded_prefixes: Vec<String>,

    /// First path segments that name a section
    #[serde(rename = "section-categories", default)]
    pub section_categories: Vec<String>,

    #[serde(default)]
    pub extract: ExtractionConfig,
}

/// CSS selectors used to pull an article out of a page
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Selector for the article title
    #[serde(rename = "title-selector", default = "default_title_selector")]
    pub title_selector: String,

    /// Content selectors, tried in order
    #[serde(rename = "content-selectors", default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// Elements removed before extraction
    #[serde(rename = "noise-selectors", default = "default_noise_selectors")]
    pub noise_selectors: Vec<String>,

    /// Minimum content length in characters
    #[serde(rename = "min-content-chars", default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            title_selector: default_title_selector(),
            content_selectors: default_content_selectors(),
            noise_selectors: default_noise_selectors(),
            min_content_chars: default_min_content_chars(),
        }
    }
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_max_concurrent() -> u32 {
    1
}

fn default_checkpoint_every() -> u64 {
    50
}

fn default_max_articles_per_site() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_max_crawl_delay_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_articles_path() -> String {
    "output/articles.jsonl".to_string()
}

fn default_checkpoint_path() -> String {
    "output/checkpoint.json".to_string()
}

fn default_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_article_markers() -> Vec<String> {
    ["article", ".article-content", ".post-content", ".content__body", "h1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_article_depth() -> usize {
    1
}

fn default_title_selector() -> String {
    "h1".to_string()
}

fn default_content_selectors() -> Vec<String> {
    ["article", ".article-content", ".post-content", ".content__body", "main"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_noise_selectors() -> Vec<String> {
    [
        "script",
        "style",
        "noscript",
        "nav",
        "header",
        "footer",
        "aside",
        "form",
        ".advertisement",
        ".ads",
        ".social-share",
        ".comments",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_content_chars() -> usize {
    100
}
