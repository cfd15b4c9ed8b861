//! Database schema for the SQLite article sink

/// SQL schema for the articles database
pub const SCHEMA_SQL: &str = r#"
-- One row per article URL; rewrites replace the previous row
CREATE TABLE IF NOT EXISTS articles (
    article_url TEXT PRIMARY KEY,
    main_url TEXT NOT NULL,
    section_url TEXT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_main_url ON articles(main_url);
CREATE INDEX IF NOT EXISTS idx_articles_section_url ON articles(section_url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
