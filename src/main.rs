//! Article-Sieve main entry point
//!
//! This is the command-line interface for the Article-Sieve harvester.

use anyhow::{bail, Context};
use article_sieve::config::{load_config_with_hash, Config, OutputFormat, SiteConfig};
use article_sieve::crawler::{crawl, SiteOutcome, StopSignal};
use article_sieve::output::{
    load_statistics, open_sink, print_run_summary, print_statistics, ArticleSink, SqliteSink,
};
use article_sieve::policy::build_policy;
use article_sieve::storage::CheckpointStore;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Article-Sieve: a polite, resumable article harvester
///
/// Article-Sieve crawls the configured content sites while respecting
/// robots.txt and a global request pace, and writes every article it finds
/// to a JSON Lines file or a SQLite database. Interrupted crawls resume from
/// the last checkpoint.
#[derive(Parser, Debug)]
#[command(name = "article-sieve")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable article harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl once, or keep crawling on the configured interval
    #[arg(long, value_enum, default_value_t = Mode::Once)]
    mode: Mode,

    /// Override the per-site article cap
    #[arg(long, value_name = "N")]
    max_articles: Option<u64>,

    /// Only crawl the given site (repeatable)
    #[arg(long = "site", value_name = "ID")]
    sites: Vec<String>,

    /// Delete any checkpoint before crawling
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show article statistics from the SQLite output and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Crawl every site once and exit
    Once,
    /// Repeat the crawl every `service.interval-secs` until interrupted
    Service,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("article_sieve=info,warn"),
            1 => EnvFilter::new("article_sieve=debug,info"),
            2 => EnvFilter::new("article_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(max) = cli.max_articles {
        if max == 0 {
            bail!("--max-articles must be at least 1");
        }
        config.crawler.max_articles_per_site = max;
    }

    if !cli.sites.is_empty() {
        for id in &cli.sites {
            if !config.sites.iter().any(|site| site.id() == id) {
                bail!("Unknown site '{}' passed to --site", id);
            }
        }
        config
            .sites
            .retain(|site| cli.sites.iter().any(|id| id == site.id()));
    }

    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Article-Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Min interval: {}ms", config.crawler.min_interval_ms);
    println!("  Max concurrent: {}", config.crawler.max_concurrent);
    println!("  Checkpoint every: {} articles", config.crawler.checkpoint_every);
    println!(
        "  Max articles per site: {}",
        config.crawler.max_articles_per_site
    );
    println!(
        "  Request timeout: {}s ({} retries)",
        config.crawler.request_timeout_secs, config.crawler.max_retries
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!(
        "  Articles: {} ({:?})",
        config.output.articles_path, config.output.format
    );
    println!("  Checkpoint: {}", config.output.checkpoint_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        build_policy(site).with_context(|| format!("Site '{}' is unusable", site.id()))?;
        println!("  - {} [{}] {}", site.id(), site.kind(), site.entry_url());
        match site {
            SiteConfig::Listing(listing) => {
                if let Some(card) = &listing.card_selector {
                    println!("    cards: {}", card);
                }
                if !listing.blocked_paths.is_empty() {
                    println!("    blocked: {}", listing.blocked_paths.join(", "));
                }
            }
            SiteConfig::Sitemap(sitemap) => {
                if !sitemap.excluded_prefixes.is_empty() {
                    println!("    excluded: {}", sitemap.excluded_prefixes.join(", "));
                }
                if !sitemap.section_categories.is_empty() {
                    println!("    sections: {}", sitemap.section_categories.join(", "));
                }
            }
        }
    }

    println!("\n✓ Configuration is valid");
    match CheckpointStore::new(&config.output.checkpoint_path).load() {
        Some(checkpoint) => println!(
            "✓ Would resume {} ({} articles, {} queued)",
            checkpoint.site,
            checkpoint.articles_scraped,
            checkpoint.queue_state.queue.len()
        ),
        None => println!("✓ Would start a fresh crawl of {} sites", config.sites.len()),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the SQLite output
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    if config.output.format != OutputFormat::Sqlite {
        bail!("--stats needs output.format = \"sqlite\"");
    }

    println!("Database: {}\n", config.output.articles_path);

    let sink = SqliteSink::open(Path::new(&config.output.articles_path))
        .context("Failed to open article database")?;
    let stats = load_statistics(&sink).context("Failed to read article statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let stop = StopSignal::new();
    stop.install_ctrl_c();

    if cli.fresh {
        tracing::info!("Starting fresh crawl (discarding any checkpoint)");
        CheckpointStore::new(&config.output.checkpoint_path).clear();
    }

    tracing::info!(
        "Sites: {}, max {} articles each",
        config.sites.len(),
        config.crawler.max_articles_per_site
    );

    let mut sink = open_sink(&config.output)
        .await
        .context("Failed to open article output")?;

    match cli.mode {
        Mode::Once => crawl_once(&config, sink.as_mut(), &stop).await,
        Mode::Service => {
            let interval = Duration::from_secs(config.service.interval_secs);
            loop {
                if let Err(e) = crawl_once(&config, sink.as_mut(), &stop).await {
                    tracing::error!("Crawl cycle failed: {:#}", e);
                }

                if stop.is_stopped() {
                    break;
                }

                tracing::info!("Next crawl in {}s", interval.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop.stopped() => break,
                }
            }
            tracing::info!("Service stopped");
            Ok(())
        }
    }
}

/// Runs one pass over every site and prints the summary
async fn crawl_once(
    config: &Config,
    sink: &mut dyn ArticleSink,
    stop: &StopSignal,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let reports = crawl(config, sink, stop.clone()).await?;

    print_run_summary(&reports, start.elapsed());

    if let Some(failed) = reports.iter().find(|r| r.outcome == SiteOutcome::Failed) {
        bail!(
            "Site {} failed; its last checkpoint was kept for the next run",
            failed.site
        );
    }

    Ok(())
}
