//! Crawler module for polite, resumable site crawling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Request pacing through a shared rate scheduler
//! - Cooperative stop handling and an injectable clock
//! - Per-site crawl orchestration with checkpoints

mod clock;
mod coordinator;
mod fetcher;
mod scheduler;
mod signal;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{
    CrawlContext, CrawlSettings, Crawler, SiteOutcome, SiteReport, SiteRun, StepOutcome,
};
pub use fetcher::{build_http_client, user_agent_string, Fetcher, HttpFetcher, RetryPolicy};
pub use scheduler::RateScheduler;
pub use signal::StopSignal;

use crate::config::Config;
use crate::output::ArticleSink;
use crate::policy::build_policy;
use crate::Result;

/// Runs a complete crawl over every configured site
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build a policy for each site
/// 2. Build the HTTP fetcher and rate scheduler
/// 3. Resume the checkpointed site first, then crawl the others in order
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Destination for article records
/// * `stop` - Signal polled between pages
///
/// # Returns
///
/// * `Ok(Vec<SiteReport>)` - One report per site that was started
/// * `Err(SieveError)` - Setup failed before any site ran
pub async fn crawl(
    config: &Config,
    sink: &mut dyn ArticleSink,
    stop: StopSignal,
) -> Result<Vec<SiteReport>> {
    let policies = config
        .sites
        .iter()
        .map(build_policy)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut crawler = Crawler::from_config(config, stop)?;
    crawler.run_sites(&policies, sink).await
}
