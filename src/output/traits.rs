//! Article sink trait and record types
//!
//! This module defines the record handed to sinks and the trait every sink
//! implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while writing articles
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One harvested article
///
/// Serialized with camelCase keys; `sectionUrl` is written as `null` when the
/// article has no section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Entry URL of the site the article belongs to
    pub main_url: String,

    /// Section listing the article, if the site has sections
    pub section_url: Option<String>,

    /// Normalized article URL
    pub article_url: String,

    pub title: String,

    /// Article body with whitespace collapsed
    pub content: String,

    pub scraped_at: DateTime<Utc>,
}

/// Destination for article records
///
/// A failed write is fatal to the current site's run; sinks should not
/// swallow errors.
#[async_trait]
pub trait ArticleSink: Send {
    /// Persists one record
    async fn write(&mut self, record: &ArticleRecord) -> SinkResult<()>;
}
