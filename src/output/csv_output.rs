//! CSV article sink

use crate::output::traits::{ArticleRecord, ArticleSink, SinkResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// One CSV row; the field names double as the header
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    main_url: &'a str,
    section_url: &'a str,
    article_url: &'a str,
    title: &'a str,
    content: &'a str,
    scraped_at: String,
}

impl<'a> From<&'a ArticleRecord> for CsvRow<'a> {
    fn from(record: &'a ArticleRecord) -> Self {
        Self {
            main_url: &record.main_url,
            section_url: record.section_url.as_deref().unwrap_or_default(),
            article_url: &record.article_url,
            title: &record.title,
            content: &record.content,
            scraped_at: record
                .scraped_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// Appends one CSV row per record, flushed after every record
///
/// The header row is written only when the file is created, so resumed
/// crawls extend the same table.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<std::fs::File>,
}

impl CsvSink {
    /// Opens (creating if needed) the output file and its parent directories
    pub fn open(path: impl Into<PathBuf>) -> SinkResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let exists = path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);

        tracing::debug!("CSV output at {} (header: {})", path.display(), !exists);
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArticleSink for CsvSink {
    async fn write(&mut self, record: &ArticleRecord) -> SinkResult<()> {
        self.writer.serialize(CsvRow::from(record))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(n: u32, section: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            main_url: "https://journal.example.com".to_string(),
            section_url: section.map(str::to_string),
            article_url: format!("https://journal.example.com/news/{}", n),
            title: format!("Article {}", n),
            content: "Body text".to_string(),
            scraped_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|row| row.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[tokio::test]
    async fn test_header_written_once_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/articles.csv");

        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.write(&record(1, Some("https://journal.example.com/news")))
                .await
                .unwrap();
        }
        let mut sink = CsvSink::open(&path).unwrap();
        sink.write(&record(2, None)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("mainUrl").count(), 1);
        assert!(content.starts_with(
            "mainUrl,sectionUrl,articleUrl,title,content,scrapedAt\n"
        ));

        let (headers, rows) = read_rows(&path);
        assert_eq!(headers.len(), 6);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "https://journal.example.com/news");
        assert_eq!(rows[1][1], "");
        assert_eq!(rows[1][2], "https://journal.example.com/news/2");
        assert_eq!(rows[1][5], "2024-03-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_fields_with_commas_quotes_and_newlines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.csv");

        let mut article = record(1, None);
        article.title = "Rates, \"again\"".to_string();
        article.content = "First line\nsecond, line".to_string();

        let mut sink = CsvSink::open(&path).unwrap();
        sink.write(&article).await.unwrap();
        sink.write(&record(2, None)).await.unwrap();

        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][3], "Rates, \"again\"");
        assert_eq!(rows[0][4], "First line\nsecond, line");
        assert_eq!(rows[1][3], "Article 2");
    }
}
