//! Article-Sieve: a polite, resumable article harvester
//!
//! This crate crawls a small set of content sites, respecting robots.txt and a
//! global request pace, and emits normalized article records to a sink. Progress
//! is checkpointed so an interrupted crawl resumes without refetching or
//! double-counting.

pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Article-Sieve operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid phase transition for site {site}: {from} -> {to}")]
    InvalidTransition {
        site: String,
        from: state::SitePhase,
        to: state::SitePhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in site '{site}': {selector}")]
    InvalidSelector { site: String, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors produced by a page fetch
///
/// Any fetch error that survives the retry policy means "skip this URL".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true if the failure is transient and worth retrying
    ///
    /// Network failures and server errors (5xx) are transient. Client errors
    /// (4xx) and malformed URLs are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Body { .. } => true,
            Self::Status { status, .. } => (500..600).contains(status),
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Result type alias for Article-Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{Frontier, FrontierState, SitePhase};
pub use self::url::{normalize, NormalizedUrl};
