//! URL frontier: ordered pending queue plus visited set
//!
//! The frontier is the single source of truth for what is left to crawl on a
//! site. A URL lives in at most one of the two collections, and a URL that has
//! been dequeued is never accepted again.

use crate::url::{normalize, NormalizedUrl};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Serializable snapshot of a frontier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierState {
    /// Pending URLs in dequeue order
    pub queue: Vec<NormalizedUrl>,

    /// URLs already handed out by `dequeue`
    pub visited: Vec<NormalizedUrl>,
}

/// FIFO frontier with hash-based deduplication
///
/// `pending` mirrors the contents of `queue` so membership checks are O(1).
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NormalizedUrl>,
    pending: HashSet<NormalizedUrl>,
    visited: HashSet<NormalizedUrl>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a URL and appends it to the tail of the queue
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and has been queued
    /// * `false` - The URL is already pending or visited
    pub fn enqueue(&mut self, url: &str) -> bool {
        let key = normalize(url);
        self.push_key(key)
    }

    /// Enqueues URLs in order, returning how many were added
    pub fn enqueue_batch<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter(|url| self.enqueue(url.as_ref()))
            .count()
    }

    /// Removes the head of the queue and marks it visited
    pub fn dequeue(&mut self) -> Option<NormalizedUrl> {
        let key = self.queue.pop_front()?;
        self.pending.remove(&key);
        self.visited.insert(key.clone());
        Some(key)
    }

    /// Returns true if there is at least one pending URL
    pub fn has_more(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of pending URLs
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs handed out so far
    pub fn visited_size(&self) -> usize {
        self.visited.len()
    }

    /// Checks whether a URL (normalized first) has been dequeued
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }

    /// Checks whether a URL (normalized first) is waiting in the queue
    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(&normalize(url))
    }

    /// Takes a snapshot of the queue (in order) and the visited set
    ///
    /// Visited URLs are sorted so snapshots of equal frontiers compare equal.
    pub fn state(&self) -> FrontierState {
        let mut visited: Vec<NormalizedUrl> = self.visited.iter().cloned().collect();
        visited.sort();

        FrontierState {
            queue: self.queue.iter().cloned().collect(),
            visited,
        }
    }

    /// Replaces the frontier contents with a snapshot
    ///
    /// Queue entries that are already visited, or repeated, are dropped so the
    /// frontier invariants hold even for a hand-edited checkpoint.
    pub fn restore_state(&mut self, state: FrontierState) {
        self.clear();

        for key in state.visited {
            self.visited.insert(normalize(key.as_str()));
        }

        let mut dropped = 0usize;
        for key in state.queue {
            if !self.push_key(normalize(key.as_str())) {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} duplicate or already-visited entries while restoring frontier",
                dropped
            );
        }
    }

    /// Empties the queue and the visited set
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.visited.clear();
    }

    fn push_key(&mut self, key: NormalizedUrl) -> bool {
        if self.visited.contains(&key) || self.pending.contains(&key) {
            return false;
        }

        self.pending.insert(key.clone());
        self.queue.push_back(key);
        true
    }
}
