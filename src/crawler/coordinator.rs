//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one site at a time:
//! - Initializing robots.txt and restoring or seeding the frontier
//! - Fetching pages through the rate scheduler
//! - Discovering links and classifying articles via the site policy
//! - Emitting records to the sink and checkpointing progress
//! - Handling interrupts and resumption

use crate::config::{Config, CrawlerConfig};
use crate::crawler::clock::{Clock, SystemClock};
use crate::crawler::fetcher::{user_agent_string, Fetcher, HttpFetcher};
use crate::crawler::scheduler::RateScheduler;
use crate::crawler::signal::StopSignal;
use crate::output::{ArticleRecord, ArticleSink};
use crate::policy::SitePolicy;
use crate::robots::RobotsCache;
use crate::state::{Frontier, SitePhase};
use crate::storage::{CheckpointRecord, CheckpointStore};
use crate::{Result, SieveError};
use std::sync::Arc;
use std::time::Duration;

/// Cadence and limits of a crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    /// Save a checkpoint whenever the site's article total is a multiple of this
    pub checkpoint_every: u64,

    /// Stop a site once its article total reaches this
    pub max_articles_per_site: u64,

    /// Widen the request interval to robots.txt `Crawl-delay`
    pub respect_crawl_delay: bool,

    /// Ceiling for a robots.txt `Crawl-delay`
    pub max_crawl_delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            checkpoint_every: config.checkpoint_every.max(1),
            max_articles_per_site: config.max_articles_per_site,
            respect_crawl_delay: config.respect_crawl_delay,
            max_crawl_delay: Duration::from_secs(config.max_crawl_delay_secs),
        }
    }
}

/// Everything a crawl depends on, passed in explicitly
pub struct CrawlContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub scheduler: Arc<RateScheduler>,
    pub checkpoints: CheckpointStore,
    pub clock: Arc<dyn Clock>,
    pub stop: StopSignal,

    /// Product token matched against robots.txt groups
    pub agent: String,

    pub settings: CrawlSettings,
}

/// How a site's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteOutcome {
    /// Frontier exhausted or article cap reached
    Completed,
    /// Stop requested; progress is in the checkpoint
    Interrupted,
    /// Unrecoverable error; the last checkpoint is left as it was
    Failed,
}

/// Per-site counters reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub site: String,
    pub outcome: SiteOutcome,

    /// Articles emitted for the site, including resumed progress
    pub articles_total: u64,

    pub articles_this_run: u64,
    pub pages_fetched: u64,

    /// Dequeued URLs rejected by scope or robots.txt
    pub pages_skipped: u64,

    pub fetch_failures: u64,
}

/// Result of one frontier iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing left to dequeue
    Exhausted,
    /// URL rejected by scope or robots.txt
    Skipped,
    /// Fetch failed after retries
    FetchFailed,
    /// Page fetched, not an article
    Page { links_added: usize },
    /// Classified as an article but extraction came back empty
    EmptyArticle { links_added: usize },
    /// Record written to the sink
    Article { links_added: usize },
}

/// Multi-site crawl driver
pub struct Crawler {
    ctx: CrawlContext,
    robots: RobotsCache,
}

impl Crawler {
    pub fn new(ctx: CrawlContext) -> Self {
        Self {
            ctx,
            robots: RobotsCache::new(),
        }
    }

    /// Builds a crawler with the HTTP fetcher and system clock
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(SieveError)` - Failed to build the HTTP client
    pub fn from_config(config: &Config, stop: StopSignal) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        let scheduler = RateScheduler::new(
            Duration::from_millis(config.crawler.min_interval_ms),
            config.crawler.max_concurrent as usize,
        );

        tracing::debug!("User agent: {}", user_agent_string(&config.user_agent));

        Ok(Self::new(CrawlContext {
            fetcher: Arc::new(fetcher),
            scheduler: Arc::new(scheduler),
            checkpoints: CheckpointStore::new(&config.output.checkpoint_path),
            clock: Arc::new(SystemClock),
            stop,
            agent: config.user_agent.crawler_name.clone(),
            settings: CrawlSettings::from_config(&config.crawler),
        }))
    }

    pub fn context(&self) -> &CrawlContext {
        &self.ctx
    }

    /// Starts a run for one site
    pub fn site<'a>(
        &'a mut self,
        policy: &'a dyn SitePolicy,
        sink: &'a mut dyn ArticleSink,
    ) -> SiteRun<'a> {
        SiteRun {
            ctx: &self.ctx,
            robots: &mut self.robots,
            policy,
            sink,
            frontier: Frontier::new(),
            phase: SitePhase::Idle,
            articles_total: 0,
            articles_this_run: 0,
            pages_fetched: 0,
            pages_skipped: 0,
            fetch_failures: 0,
            last_processed_url: None,
        }
    }

    /// Crawls every site in turn
    ///
    /// A site named by the existing checkpoint goes first so its progress is
    /// resumed before another site writes the checkpoint file. The run stops
    /// after an interrupted or failed site.
    pub async fn run_sites(
        &mut self,
        policies: &[Box<dyn SitePolicy>],
        sink: &mut dyn ArticleSink,
    ) -> Result<Vec<SiteReport>> {
        let mut order: Vec<&dyn SitePolicy> = policies.iter().map(|p| p.as_ref()).collect();

        if let Some(checkpoint) = self.ctx.checkpoints.load() {
            match order.iter().position(|p| p.id() == checkpoint.site) {
                Some(pos) => {
                    let policy = order.remove(pos);
                    order.insert(0, policy);
                    tracing::info!(
                        site = %checkpoint.site,
                        "Found checkpoint from {}, resuming this site first",
                        checkpoint.timestamp
                    );
                }
                None => tracing::warn!(
                    site = %checkpoint.site,
                    "Checkpoint belongs to a site outside this run and may be overwritten"
                ),
            }
        }

        let mut reports = Vec::with_capacity(order.len());
        for policy in order {
            if self.ctx.stop.is_stopped() {
                break;
            }

            let mut run = self.site(policy, &mut *sink);
            let report = match run.run().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(site = %policy.id(), "Site crawl failed: {}", e);
                    run.report(SiteOutcome::Failed)
                }
            };

            let outcome = report.outcome;
            reports.push(report);
            if outcome != SiteOutcome::Completed {
                break;
            }
        }

        Ok(reports)
    }
}

/// One site's crawl: frontier, counters and phase
pub struct SiteRun<'a> {
    ctx: &'a CrawlContext,
    robots: &'a mut RobotsCache,
    policy: &'a dyn SitePolicy,
    sink: &'a mut dyn ArticleSink,
    frontier: Frontier,
    phase: SitePhase,
    articles_total: u64,
    articles_this_run: u64,
    pages_fetched: u64,
    pages_skipped: u64,
    fetch_failures: u64,
    last_processed_url: Option<String>,
}

impl<'a> SiteRun<'a> {
    pub fn phase(&self) -> SitePhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn articles_total(&self) -> u64 {
        self.articles_total
    }

    /// Loads robots.txt, then restores the frontier from this site's
    /// checkpoint or seeds it from the policy
    pub async fn resume_or_seed(&mut self) -> Result<()> {
        self.transition(SitePhase::Resuming)?;

        let ctx = self.ctx;
        let policy = self.policy;
        let domain = policy.domain();
        self.robots
            .initialize(domain, ctx.fetcher.as_ref(), &ctx.scheduler)
            .await;

        if ctx.settings.respect_crawl_delay {
            if let Some(delay) = self.robots.crawl_delay(domain, &ctx.agent) {
                let max = ctx.settings.max_crawl_delay;
                if delay > max {
                    tracing::warn!(
                        site = %policy.id(),
                        "Crawl-delay of {:?} exceeds the {:?} ceiling, using the ceiling",
                        delay,
                        max
                    );
                }
                ctx.scheduler.widen_interval(delay.min(max)).await;
            }
        }

        match ctx.checkpoints.load() {
            Some(checkpoint) if checkpoint.site == policy.id() => {
                self.frontier.restore_state(checkpoint.queue_state);
                self.articles_total = checkpoint.articles_scraped;
                self.last_processed_url = checkpoint.last_processed_url;
                tracing::info!(
                    site = %policy.id(),
                    "Resumed: {} articles so far, {} queued, {} visited",
                    self.articles_total,
                    self.frontier.queue_size(),
                    self.frontier.visited_size()
                );
            }
            other => {
                if let Some(checkpoint) = other {
                    tracing::debug!(
                        "Ignoring checkpoint of site {} for {}",
                        checkpoint.site,
                        policy.id()
                    );
                }

                let seeds = policy.seed_urls(ctx.fetcher.as_ref(), &ctx.scheduler).await;
                let found = seeds.len();
                let in_scope: Vec<String> = seeds
                    .into_iter()
                    .filter(|url| policy.is_in_scope_url(url))
                    .collect();
                let added = self.frontier.enqueue_batch(in_scope);
                tracing::info!(
                    site = %policy.id(),
                    traversal = %policy.traversal(),
                    "Seeded frontier with {} of {} URLs",
                    added,
                    found
                );
            }
        }

        self.transition(SitePhase::Running)
    }

    /// Processes the next frontier URL
    ///
    /// Fetch failures are logged and skipped. A sink failure moves the site
    /// to `Failed` and is returned; the last checkpoint stays on disk.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let Some(url) = self.frontier.dequeue() else {
            return Ok(StepOutcome::Exhausted);
        };
        let url = url.into_string();
        self.last_processed_url = Some(url.clone());

        let ctx = self.ctx;
        let policy = self.policy;

        if !policy.is_in_scope_url(&url) {
            tracing::debug!("Skipping {} - out of scope", url);
            self.pages_skipped += 1;
            return Ok(StepOutcome::Skipped);
        }

        if !self.robots.is_allowed(&url, policy.domain(), &ctx.agent) {
            tracing::debug!("Skipping {} - blocked by robots.txt", url);
            self.pages_skipped += 1;
            return Ok(StepOutcome::Skipped);
        }

        let html = match ctx.scheduler.schedule(|| ctx.fetcher.fetch(&url)).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.fetch_failures += 1;
                return Ok(StepOutcome::FetchFailed);
            }
        };
        self.pages_fetched += 1;

        let links: Vec<String> = policy
            .discover_links(&html, &url)
            .into_iter()
            .filter(|link| policy.is_in_scope_url(link))
            .collect();
        let links_added = self.frontier.enqueue_batch(links);

        if !policy.is_article_url(&url, &html) {
            return Ok(StepOutcome::Page { links_added });
        }

        let article = policy.extract_article(&html);
        if article.is_empty {
            tracing::debug!("Empty or invalid article at {}", url);
            return Ok(StepOutcome::EmptyArticle { links_added });
        }

        let record = ArticleRecord {
            main_url: policy.main_url(),
            section_url: policy.section_url(&url),
            article_url: url,
            title: article.title,
            content: article.content,
            scraped_at: ctx.clock.now(),
        };

        if let Err(e) = self.sink.write(&record).await {
            tracing::error!(
                site = %policy.id(),
                "Failed to write article {}: {}",
                record.article_url,
                e
            );
            self.transition(SitePhase::Failed)?;
            return Err(e.into());
        }

        self.articles_total += 1;
        self.articles_this_run += 1;

        if self.articles_this_run % 10 == 0 {
            tracing::info!(
                site = %policy.id(),
                "Progress: {} articles scraped, {} in queue, {} visited",
                self.articles_total,
                self.frontier.queue_size(),
                self.frontier.visited_size()
            );
        }

        if self.articles_total % ctx.settings.checkpoint_every == 0 {
            self.checkpoint()?;
        }

        Ok(StepOutcome::Article { links_added })
    }

    /// Drives the site until the frontier is exhausted, the article cap is
    /// reached or a stop is requested
    pub async fn run(&mut self) -> Result<SiteReport> {
        tracing::info!(site = %self.policy.id(), "Starting site crawl");
        self.resume_or_seed().await?;

        let cap = self.ctx.settings.max_articles_per_site;
        loop {
            if self.ctx.stop.is_stopped() {
                self.checkpoint()?;
                tracing::info!(
                    site = %self.policy.id(),
                    "Stopped with {} articles; progress saved to {}",
                    self.articles_total,
                    self.ctx.checkpoints.path().display()
                );
                return Ok(self.report(SiteOutcome::Interrupted));
            }

            if self.articles_total >= cap {
                tracing::info!(site = %self.policy.id(), "Reached max articles limit: {}", cap);
                break;
            }

            if self.step().await? == StepOutcome::Exhausted {
                break;
            }
        }

        self.finish()?;
        Ok(self.report(SiteOutcome::Completed))
    }

    /// Snapshots the frontier and counter to the checkpoint file
    fn checkpoint(&mut self) -> Result<()> {
        self.transition(SitePhase::Checkpointing)?;
        self.ctx.checkpoints.save(&CheckpointRecord {
            site: self.policy.id().to_string(),
            queue_state: self.frontier.state(),
            articles_scraped: self.articles_total,
            last_processed_url: self.last_processed_url.clone(),
            timestamp: self.ctx.clock.now(),
        });
        self.transition(SitePhase::Running)
    }

    /// Marks the site completed, drops its checkpoint and clears the frontier
    fn finish(&mut self) -> Result<()> {
        self.transition(SitePhase::Completed)?;

        match self.ctx.checkpoints.load() {
            Some(checkpoint) if checkpoint.site != self.policy.id() => {}
            _ => self.ctx.checkpoints.clear(),
        }
        self.frontier.clear();

        tracing::info!(
            site = %self.policy.id(),
            "Site crawl completed: {} articles this run, {} total",
            self.articles_this_run,
            self.articles_total
        );
        Ok(())
    }

    pub fn report(&self, outcome: SiteOutcome) -> SiteReport {
        SiteReport {
            site: self.policy.id().to_string(),
            outcome,
            articles_total: self.articles_total,
            articles_this_run: self.articles_this_run,
            pages_fetched: self.pages_fetched,
            pages_skipped: self.pages_skipped,
            fetch_failures: self.fetch_failures,
        }
    }

    fn transition(&mut self, next: SitePhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(SieveError::InvalidTransition {
                site: self.policy.id().to_string(),
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("{}: {} -> {}", self.policy.id(), self.phase, next);
        self.phase = next;
        Ok(())
    }
}
