//! JSON file checkpoint store
//!
//! Checkpoint I/O never fails the crawl: save errors are logged and swallowed,
//! and an unreadable checkpoint is treated as absent.

use crate::storage::{CheckpointRecord, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed checkpoint store
///
/// Holds no state besides the target path; how often to save is decided by
/// the crawl coordinator.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Creates a store that reads and writes the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists a checkpoint, replacing any previous one
    ///
    /// The parent directory is created if needed. Failures are logged and
    /// swallowed.
    pub fn save(&self, record: &CheckpointRecord) {
        match self.try_save(record) {
            Ok(()) => tracing::debug!(
                "Checkpoint saved for {} ({} articles, {} queued)",
                record.site,
                record.articles_scraped,
                record.queue_state.queue.len()
            ),
            Err(e) => tracing::error!(
                "Failed to save checkpoint to {}: {}",
                self.path.display(),
                e
            ),
        }
    }

    /// Persists a checkpoint and reports failures to the caller
    ///
    /// The document is written to a sibling temporary file and renamed over
    /// the target, so a crash mid-write leaves the previous checkpoint intact.
    pub fn try_save(&self, record: &CheckpointRecord) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Loads the checkpoint, if one exists and is readable
    ///
    /// # Returns
    ///
    /// * `Some(CheckpointRecord)` - A valid checkpoint was found
    /// * `None` - No checkpoint, or the file could not be read or parsed
    pub fn load(&self) -> Option<CheckpointRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read checkpoint {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Deletes the checkpoint file; a missing file is not an error
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Checkpoint {} cleared", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to clear checkpoint {}: {}",
                self.path.display(),
                e
            ),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
