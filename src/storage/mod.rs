//! Storage module for persisting crawl progress
//!
//! This module handles the durable checkpoint that lets an interrupted site
//! crawl resume: the frontier snapshot plus the article counter, written as a
//! single JSON document.

mod checkpoint;

pub use checkpoint::CheckpointStore;

use crate::state::FrontierState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while persisting a checkpoint
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable snapshot of one site's crawl progress
///
/// `articles_scraped` only ever grows across resumes of the same site and is
/// independent of the frontier size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointRecord {
    /// Site identifier the checkpoint belongs to
    pub site: String,

    /// Frontier snapshot at the time of the checkpoint
    pub queue_state: FrontierState,

    /// Articles emitted to the sink for this site so far
    pub articles_scraped: u64,

    /// Last URL taken from the frontier
    #[serde(default)]
    pub last_processed_url: Option<String>,

    /// When the checkpoint was written
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize;
    use chrono::TimeZone;

    #[test]
    fn test_checkpoint_json_shape() {
        let record = CheckpointRecord {
            site: "news".to_string(),
            queue_state: FrontierState {
                queue: vec![normalize("https://example.com/b")],
                visited: vec![normalize("https://example.com/a")],
            },
            articles_scraped: 7,
            last_processed_url: Some("https://example.com/a".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["site"], "news");
        assert_eq!(value["articlesScraped"], 7);
        assert_eq!(value["lastProcessedUrl"], "https://example.com/a");
        assert_eq!(value["queueState"]["queue"][0], "https://example.com/b");
        assert_eq!(value["queueState"]["visited"][0], "https://example.com/a");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_checkpoint_without_last_url() {
        let json = r#"{
            "site": "guides",
            "queueState": { "queue": [], "visited": [] },
            "articlesScraped": 0,
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;

        let record: CheckpointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.site, "guides");
        assert!(record.last_processed_url.is_none());
    }
}
