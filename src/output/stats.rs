//! Run summaries and article statistics
//!
//! This module prints the per-site outcome of a crawl and, for the SQLite
//! sink, the article counts stored so far.

use crate::crawler::{SiteOutcome, SiteReport};
use crate::output::sqlite_output::SqliteSink;
use crate::output::traits::SinkResult;
use std::time::Duration;

/// Article statistics read from the SQLite sink
#[derive(Debug, Clone, Default)]
pub struct ArticleStatistics {
    /// Total number of stored articles
    pub total_articles: u64,

    /// Article counts per site main URL
    pub by_main_url: Vec<(String, u64)>,

    /// Largest sections
    pub top_sections: Vec<(String, u64)>,

    /// Most recent `scraped_at` value
    pub latest_scraped_at: Option<String>,
}

/// Loads statistics from the sink database
pub fn load_statistics(sink: &SqliteSink) -> SinkResult<ArticleStatistics> {
    Ok(ArticleStatistics {
        total_articles: sink.count_articles()?,
        by_main_url: sink.count_by_main_url()?,
        top_sections: sink.count_by_section(10)?,
        latest_scraped_at: sink.latest_scraped_at()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArticleStatistics) {
    println!("=== Article Statistics ===\n");

    println!("Overview:");
    println!("  Total articles: {}", stats.total_articles);
    if let Some(latest) = &stats.latest_scraped_at {
        println!("  Last scraped: {}", latest);
    }
    println!();

    if !stats.by_main_url.is_empty() {
        println!("Articles by Site:");
        for (main_url, count) in &stats.by_main_url {
            let percentage = if stats.total_articles > 0 {
                (*count as f64 / stats.total_articles as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", main_url, count, percentage);
        }
        println!();
    }

    if !stats.top_sections.is_empty() {
        println!("Top Sections:");
        for (section, count) in &stats.top_sections {
            println!("  {}: {}", section, count);
        }
        println!();
    }
}

/// Prints the outcome of every site crawled in a run
pub fn print_run_summary(reports: &[SiteReport], elapsed: Duration) {
    println!("=== Crawl Summary ===\n");

    for report in reports {
        let outcome = match report.outcome {
            SiteOutcome::Completed => "completed",
            SiteOutcome::Interrupted => "interrupted",
            SiteOutcome::Failed => "FAILED",
        };
        println!("{} ({}):", report.site, outcome);
        println!(
            "  Articles: {} this run, {} total",
            report.articles_this_run, report.articles_total
        );
        println!(
            "  Pages: {} fetched, {} skipped, {} failed",
            report.pages_fetched, report.pages_skipped, report.fetch_failures
        );
    }

    let articles: u64 = reports.iter().map(|r| r.articles_this_run).sum();
    println!();
    println!(
        "{} articles from {} sites in {:.1}s",
        articles,
        reports.len(),
        elapsed.as_secs_f64()
    );
}
