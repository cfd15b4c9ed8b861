//! Global rate scheduler
//!
//! Every outbound request (pages, robots.txt, sitemaps) runs through one
//! `RateScheduler`. It enforces:
//! - a cap on in-flight tasks (a fair semaphore, so waiters are served FIFO)
//! - a minimum interval between consecutive task starts
//!
//! Tasks start in the order they were submitted.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// Start-slot bookkeeping guarded by the pacing lock
#[derive(Debug)]
struct Pacing {
    /// Minimum gap between two task starts
    min_interval: Duration,

    /// When the previous task started
    last_start: Option<Instant>,
}

/// Serializes and paces asynchronous tasks
///
/// Shared between components as `Arc<RateScheduler>`.
#[derive(Debug)]
pub struct RateScheduler {
    permits: Semaphore,
    pacing: Mutex<Pacing>,
}

impl RateScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `min_interval` - Minimum time between consecutive task starts
    /// * `max_concurrent` - Maximum number of tasks in flight (at least 1)
    pub fn new(min_interval: Duration, max_concurrent: usize) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            pacing: Mutex::new(Pacing {
                min_interval,
                last_start: None,
            }),
        }
    }

    /// Runs a task once a concurrency permit and a start slot are available
    ///
    /// The task's output (including any error) is returned unchanged.
    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // The semaphore is never closed, so acquisition cannot fail
        let _permit = self.permits.acquire().await.ok();

        {
            let mut pacing = self.pacing.lock().await;
            if let Some(last) = pacing.last_start {
                let ready_at = last + pacing.min_interval;
                if ready_at > Instant::now() {
                    tracing::trace!(
                        "Waiting {:?} for next request slot",
                        ready_at - Instant::now()
                    );
                    tokio::time::sleep_until(ready_at).await;
                }
            }
            pacing.last_start = Some(Instant::now());
        }

        task().await
    }

    /// Returns the current minimum interval between starts
    pub async fn min_interval(&self) -> Duration {
        self.pacing.lock().await.min_interval
    }

    /// Raises the minimum interval to `interval` if it is larger
    ///
    /// Used to honor a robots.txt `Crawl-delay`. The interval never shrinks.
    pub async fn widen_interval(&self, interval: Duration) {
        let mut pacing = self.pacing.lock().await;
        if interval > pacing.min_interval {
            tracing::info!(
                "Raising request interval from {:?} to {:?}",
                pacing.min_interval,
                interval
            );
            pacing.min_interval = interval;
        }
    }
}
