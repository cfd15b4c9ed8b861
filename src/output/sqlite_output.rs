//! SQLite article sink
//!
//! Records land in a single `articles` table keyed by article URL, so
//! re-harvesting an article replaces its row instead of duplicating it.

use crate::output::schema::initialize_schema;
use crate::output::traits::{ArticleRecord, ArticleSink, SinkResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed sink
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database or create its directory
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts or replaces one article row
    pub fn insert(&self, record: &ArticleRecord) -> SinkResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO articles
                (article_url, main_url, section_url, title, content, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.article_url,
                record.main_url,
                record.section_url,
                record.title,
                record.content,
                record.scraped_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Total number of stored articles
    pub fn count_articles(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Article counts grouped by main URL, largest first
    pub fn count_by_main_url(&self) -> SinkResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT main_url, COUNT(*) AS n FROM articles
             GROUP BY main_url ORDER BY n DESC, main_url",
        )
    }

    /// Article counts grouped by section URL, largest first
    pub fn count_by_section(&self, limit: usize) -> SinkResult<Vec<(String, u64)>> {
        let mut counts = self.grouped_counts(
            "SELECT section_url, COUNT(*) AS n FROM articles
             WHERE section_url IS NOT NULL
             GROUP BY section_url ORDER BY n DESC, section_url",
        )?;
        counts.truncate(limit);
        Ok(counts)
    }

    /// Timestamp of the most recently scraped article
    pub fn latest_scraped_at(&self) -> SinkResult<Option<String>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(scraped_at) FROM articles", [], |row| row.get(0))?;
        Ok(latest)
    }

    fn grouped_counts(&self, sql: &str) -> SinkResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

#[async_trait]
impl ArticleSink for SqliteSink {
    async fn write(&mut self, record: &ArticleRecord) -> SinkResult<()> {
        self.insert(record)
    }
}
