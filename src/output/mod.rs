//! Output module for harvested articles
//!
//! This module handles:
//! - Writing article records to a JSON Lines file, a CSV file or a SQLite
//!   database
//! - Printing run summaries and stored-article statistics

mod csv_output;
mod jsonl;
mod schema;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use jsonl::JsonLinesSink;
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_run_summary, print_statistics, ArticleStatistics};
pub use traits::{ArticleRecord, ArticleSink, SinkError, SinkResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink selected by the output configuration
///
/// # Returns
///
/// * `Ok(Box<dyn ArticleSink>)` - Sink ready for writing
/// * `Err(SinkError)` - Failed to create the output file or database
pub async fn open_sink(config: &OutputConfig) -> SinkResult<Box<dyn ArticleSink>> {
    let path = Path::new(&config.articles_path);
    let sink: Box<dyn ArticleSink> = match config.format {
        OutputFormat::Jsonl => Box::new(JsonLinesSink::open(path).await?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path)?),
        OutputFormat::Csv => Box::new(CsvSink::open(path)?),
    };

    tracing::info!(
        "Writing articles to {} ({:?})",
        config.articles_path,
        config.format
    );
    Ok(sink)
}
