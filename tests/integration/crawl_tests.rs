//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run site crawls
//! end-to-end: robots.txt, sitemaps, listing pages, sinks and checkpoints.

use article_sieve::config::{
    Config, CrawlerConfig, ExtractionConfig, ListingSiteConfig, OutputConfig, OutputFormat,
    ServiceConfig, SiteConfig, SitemapSiteConfig, UserAgentConfig,
};
use article_sieve::crawler::{
    build_http_client, crawl, CrawlContext, CrawlSettings, Crawler, FixedClock, HttpFetcher,
    RateScheduler, RetryPolicy, SiteOutcome, StepOutcome, StopSignal,
};
use article_sieve::output::{
    load_statistics, ArticleRecord, ArticleSink, SinkError, SinkResult, SqliteSink,
};
use article_sieve::policy::{build_policy, ListingPolicy, SitePolicy};
use article_sieve::storage::{CheckpointRecord, CheckpointStore};
use article_sieve::{normalize, FrontierState};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY_TEXT: &str = "Central banks kept rates on hold this week while markets \
    weighed fresh inflation data and signals from the bond market about the path ahead.";

/// Collects records in memory
#[derive(Default)]
struct MemorySink {
    records: Vec<ArticleRecord>,
}

#[async_trait]
impl ArticleSink for MemorySink {
    async fn write(&mut self, record: &ArticleRecord) -> SinkResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Rejects every write, like a full disk
struct FailingSink;

#[async_trait]
impl ArticleSink for FailingSink {
    async fn write(&mut self, _record: &ArticleRecord) -> SinkResult<()> {
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no space left on device",
        )))
    }
}

/// Requests a stop right after its first successful write
struct StoppingSink {
    inner: MemorySink,
    stop: StopSignal,
}

#[async_trait]
impl ArticleSink for StoppingSink {
    async fn write(&mut self, record: &ArticleRecord) -> SinkResult<()> {
        self.inner.write(record).await?;
        self.stop.request_stop();
        Ok(())
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, format: OutputFormat, sites: Vec<SiteConfig>) -> Config {
    let articles = match format {
        OutputFormat::Jsonl => "articles.jsonl",
        OutputFormat::Sqlite => "articles.db",
        OutputFormat::Csv => "articles.csv",
    };

    Config {
        crawler: CrawlerConfig {
            min_interval_ms: 0,
            max_concurrent: 1,
            request_timeout_secs: 5,
            max_retries: 0,
            retry_base_delay_ms: 1,
            ..CrawlerConfig::default()
        },
        user_agent: user_agent(),
        output: OutputConfig {
            articles_path: dir.join(articles).to_string_lossy().into_owned(),
            format,
            checkpoint_path: dir.join("checkpoint.json").to_string_lossy().into_owned(),
        },
        service: ServiceConfig::default(),
        sites,
    }
}

fn listing_site(id: &str, root_url: String) -> ListingSiteConfig {
    ListingSiteConfig {
        id: id.to_string(),
        root_url,
        card_selector: None,
        article_markers: vec!["article".to_string(), "h1".to_string()],
        blocked_paths: vec![],
        tracking_params: vec!["utm_source".to_string()],
        min_article_depth: 1,
        extract: ExtractionConfig::default(),
    }
}

/// Builds a crawler against the mock server with a fixed clock
fn test_crawler(dir: &Path) -> Crawler {
    let client = build_http_client(&user_agent(), Duration::from_secs(5)).unwrap();

    Crawler::new(CrawlContext {
        fetcher: Arc::new(HttpFetcher::new(
            client,
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
        )),
        scheduler: Arc::new(RateScheduler::new(Duration::ZERO, 1)),
        checkpoints: CheckpointStore::new(dir.join("checkpoint.json")),
        clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap())),
        stop: StopSignal::new(),
        agent: "TestBot".to_string(),
        settings: CrawlSettings {
            checkpoint_every: 50,
            max_articles_per_site: 500,
            respect_crawl_delay: true,
            max_crawl_delay: Duration::from_secs(60),
        },
    })
}

fn article_page(title: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title><script>track()</script></head><body>
        <nav><a href="/news">News</a></nav>
        <h1>{title}</h1>
        <article><p>{BODY_TEXT}</p></article>
        <footer>Copyright</footer>
        </body></html>"#
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_root_listing_enqueues_in_scope_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/news",
        format!(
            r#"<html><body>
            <a href="/news/alpha">A</a>
            <a href="/news/beta">B</a>
            <a href="{base_url}/news/gamma">C</a>
            <a href="/news/delta#comments">D</a>
            <a href="/news/epsilon?utm_source=feed">tracked</a>
            <a href="/news/epsilon">E</a>
            <a href="/about">About</a>
            <a href="https://elsewhere.example.org/news/x">Elsewhere</a>
            <a href="mailto:desk@example.com">Mail</a>
            <a href="/news">Self</a>
            </body></html>"#
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut crawler = test_crawler(dir.path());
    let policy = ListingPolicy::from_config(&listing_site("news", format!("{}/news", base_url)))
        .unwrap();
    let mut sink = MemorySink::default();
    let mut run = crawler.site(&policy, &mut sink);

    run.resume_or_seed().await.unwrap();
    assert_eq!(run.frontier().queue_size(), 1);

    let outcome = run.step().await.unwrap();
    assert_eq!(outcome, StepOutcome::Page { links_added: 5 });
    assert_eq!(run.frontier().queue_size(), 5);
    assert!(run.frontier().is_visited(&format!("{}/news", base_url)));
    assert!(run.frontier().is_pending(&format!("{}/news/delta", base_url)));
    assert!(!run.frontier().is_pending(&format!("{}/about", base_url)));
    assert_eq!(run.articles_total(), 0);
}

#[tokio::test]
async fn test_full_listing_crawl_writes_jsonl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No robots.txt mock: the 404 means everything is allowed

    mount_page(
        &mock_server,
        "/news",
        r#"<html><body>
        <a href="/news/rates-on-hold">Rates</a>
        <a href="/news/markets/bond-rally">Bonds</a>
        <a href="/news/tag-page">Tags</a>
        </body></html>"#,
    )
    .await;
    mount_page(&mock_server, "/news/rates-on-hold", article_page("Rates On Hold")).await;
    mount_page(&mock_server, "/news/markets/bond-rally", article_page("Bond Rally")).await;
    mount_page(
        &mock_server,
        "/news/tag-page",
        r#"<html><body><p>Just a tag listing</p><a href="/news">Back</a></body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        OutputFormat::Jsonl,
        vec![SiteConfig::Listing(listing_site(
            "news",
            format!("{}/news", base_url),
        ))],
    );

    let mut sink = article_sieve::output::open_sink(&config.output).await.unwrap();
    let reports = crawl(&config, sink.as_mut(), StopSignal::new()).await.unwrap();
    drop(sink);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, SiteOutcome::Completed);
    assert_eq!(reports[0].articles_this_run, 2);
    assert_eq!(reports[0].pages_fetched, 4);

    let written = std::fs::read_to_string(&config.output.articles_path).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    let rates = lines
        .iter()
        .find(|l| l["articleUrl"] == format!("{}/news/rates-on-hold", base_url))
        .expect("rates article written");
    assert_eq!(rates["title"], "Rates On Hold");
    assert_eq!(rates["mainUrl"], format!("{}/news", base_url));
    assert_eq!(rates["sectionUrl"], format!("{}/news", base_url));
    assert!(rates["content"].as_str().unwrap().starts_with("Central banks"));
    assert!(!rates["content"].as_str().unwrap().contains("Copyright"));

    let bonds = lines
        .iter()
        .find(|l| l["title"] == "Bond Rally")
        .expect("bond article written");
    assert_eq!(bonds["sectionUrl"], format!("{}/news/markets", base_url));

    // Completed sites leave no checkpoint behind
    assert!(!Path::new(&config.output.checkpoint_path).exists());
}

#[tokio::test]
async fn test_repeated_crawls_append_to_one_csv_table() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/news",
        r#"<html><body><a href="/news/rates-on-hold">Rates</a></body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/news/rates-on-hold",
        article_page("Rates, Bonds and \"Yields\""),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        OutputFormat::Csv,
        vec![SiteConfig::Listing(listing_site(
            "news",
            format!("{}/news", base_url),
        ))],
    );

    for _ in 0..2 {
        let mut sink = article_sieve::output::open_sink(&config.output).await.unwrap();
        let reports = crawl(&config, sink.as_mut(), StopSignal::new()).await.unwrap();
        assert_eq!(reports[0].articles_this_run, 1);
    }

    let written = std::fs::read_to_string(&config.output.articles_path).unwrap();
    assert_eq!(written.matches("mainUrl,sectionUrl").count(), 1);

    let mut reader = csv::Reader::from_path(&config.output.articles_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][2], format!("{}/news/rates-on-hold", base_url));
    assert_eq!(&rows[0][3], "Rates, Bonds and \"Yields\"");
    assert!(rows[0][4].starts_with("Central banks"));
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /news/private"),
        )
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/news",
        r#"<html><body>
        <a href="/news/private/secret">Secret</a>
        <a href="/news/open-story">Open</a>
        </body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/news/private/secret"))
        .respond_with(html(article_page("Secret")))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/news/open-story"))
        .respond_with(html(article_page("Open Story")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut crawler = test_crawler(dir.path());
    let policy = ListingPolicy::from_config(&listing_site("news", format!("{}/news", base_url)))
        .unwrap();
    let mut sink = MemorySink::default();

    let report = crawler.site(&policy, &mut sink).run().await.unwrap();

    assert_eq!(report.outcome, SiteOutcome::Completed);
    assert_eq!(report.pages_skipped, 1);
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].title, "Open Story");
    assert_eq!(
        sink.records[0].scraped_at,
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn test_resume_from_checkpoint_never_revisits() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/news", base_url);

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html("<html><body>root</body></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/news/p{}", i)))
            .respond_with(html(
                r#"<html><body><p>Listing</p><a href="/news">Back</a><a href="/news/p0">First</a></body></html>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    CheckpointStore::new(dir.path().join("checkpoint.json")).save(&CheckpointRecord {
        site: "news".to_string(),
        queue_state: FrontierState {
            queue: (0..10)
                .map(|i| normalize(&format!("{}/news/p{}", base_url, i)))
                .collect(),
            visited: vec![normalize(&root)],
        },
        articles_scraped: 50,
        last_processed_url: Some(root.clone()),
        timestamp: Utc::now(),
    });

    let mut crawler = test_crawler(dir.path());
    let policy = ListingPolicy::from_config(&listing_site("news", root.clone())).unwrap();
    let mut sink = MemorySink::default();
    let mut run = crawler.site(&policy, &mut sink);

    run.resume_or_seed().await.unwrap();
    assert_eq!(run.frontier().queue_size(), 10);
    assert_eq!(run.articles_total(), 50);

    let mut fetched = 0;
    loop {
        match run.step().await.unwrap() {
            StepOutcome::Exhausted => break,
            StepOutcome::Page { links_added } => {
                assert_eq!(links_added, 0);
                fetched += 1;
            }
            other => panic!("unexpected step outcome: {:?}", other),
        }
    }

    assert_eq!(fetched, 10);
    assert_eq!(run.frontier().visited_size(), 11);
    assert_eq!(run.articles_total(), 50);
}

#[tokio::test]
async fn test_sitemap_index_skips_failing_child() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{base_url}/sitemap-posts.xml</loc></sitemap>
              <sitemap><loc>{base_url}/sitemap-broken.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-posts.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{base_url}/guides/first-guide</loc></url>
              <url><loc>{base_url}/news/second-post</loc></url>
              <url><loc>{base_url}/tag/rust</loc></url>
              <url><loc>{base_url}/</loc></url>
            </urlset>"#
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/guides/first-guide", article_page("First Guide")).await;
    mount_page(&mock_server, "/news/second-post", article_page("Second Post")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        OutputFormat::Sqlite,
        vec![SiteConfig::Sitemap(SitemapSiteConfig {
            id: "blog".to_string(),
            base_url: format!("{}/", base_url),
            sitemap_url: format!("{}/sitemap_index.xml", base_url),
            excluded_prefixes: vec!["/tag/".to_string()],
            section_categories: vec!["guides".to_string()],
            extract: ExtractionConfig::default(),
        })],
    );

    let mut sink = article_sieve::output::open_sink(&config.output).await.unwrap();
    let reports = crawl(&config, sink.as_mut(), StopSignal::new()).await.unwrap();
    drop(sink);

    assert_eq!(reports[0].outcome, SiteOutcome::Completed);
    assert_eq!(reports[0].pages_fetched, 2);
    assert_eq!(reports[0].articles_this_run, 2);

    let db = SqliteSink::open(Path::new(&config.output.articles_path)).unwrap();
    let stats = load_statistics(&db).unwrap();
    assert_eq!(stats.total_articles, 2);
    assert_eq!(stats.by_main_url, vec![(base_url.clone(), 2)]);
    assert_eq!(
        stats.top_sections,
        vec![(format!("{}/guides", base_url), 1)]
    );
}

#[tokio::test]
async fn test_sink_failure_keeps_checkpoint() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/news/story", article_page("Story")).await;

    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let saved = CheckpointRecord {
        site: "news".to_string(),
        queue_state: FrontierState {
            queue: vec![normalize(&format!("{}/news/story", base_url))],
            visited: vec![normalize(&format!("{}/news", base_url))],
        },
        articles_scraped: 3,
        last_processed_url: None,
        timestamp: Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap(),
    };
    store.save(&saved);

    let mut crawler = test_crawler(dir.path());
    let site = SiteConfig::Listing(listing_site("news", format!("{}/news", base_url)));
    let policies: Vec<Box<dyn SitePolicy>> = vec![build_policy(&site).unwrap()];

    let reports = crawler.run_sites(&policies, &mut FailingSink).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, SiteOutcome::Failed);
    assert_eq!(reports[0].articles_this_run, 0);
    assert_eq!(store.load(), Some(saved));
}

#[tokio::test]
async fn test_interrupted_crawl_resumes() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html(
            r#"<html><body>
            <a href="/news/story-one">One</a>
            <a href="/news/story-two">Two</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news/story-one"))
        .respond_with(html(article_page("Story One")))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/news/story-two", article_page("Story Two")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        OutputFormat::Jsonl,
        vec![SiteConfig::Listing(listing_site(
            "news",
            format!("{}/news", base_url),
        ))],
    );

    // First run stops after the first article
    let stop = StopSignal::new();
    let mut sink = StoppingSink {
        inner: MemorySink::default(),
        stop: stop.clone(),
    };
    let reports = crawl(&config, &mut sink, stop).await.unwrap();
    assert_eq!(reports[0].outcome, SiteOutcome::Interrupted);
    assert_eq!(sink.inner.records.len(), 1);

    let checkpoint = CheckpointStore::new(&config.output.checkpoint_path)
        .load()
        .expect("checkpoint written on stop");
    assert_eq!(checkpoint.site, "news");
    assert_eq!(checkpoint.articles_scraped, 1);
    assert_eq!(
        checkpoint.queue_state.queue,
        vec![normalize(&format!("{}/news/story-two", base_url))]
    );
    assert_eq!(
        checkpoint.last_processed_url,
        Some(format!("{}/news/story-one", base_url))
    );

    // Second run picks up the remaining article only
    let mut sink = MemorySink::default();
    let reports = crawl(&config, &mut sink, StopSignal::new()).await.unwrap();
    assert_eq!(reports[0].outcome, SiteOutcome::Completed);
    assert_eq!(reports[0].articles_total, 2);
    assert_eq!(reports[0].articles_this_run, 1);
    assert_eq!(sink.records[0].title, "Story Two");
    assert!(CheckpointStore::new(&config.output.checkpoint_path)
        .load()
        .is_none());
}

#[tokio::test]
async fn test_checkpointed_site_runs_first() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/alpha", "<html><body>alpha</body></html>").await;
    mount_page(&mock_server, "/beta", "<html><body>beta</body></html>").await;

    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    store.save(&CheckpointRecord {
        site: "beta".to_string(),
        queue_state: FrontierState {
            queue: vec![normalize(&format!("{}/beta", base_url))],
            visited: vec![],
        },
        articles_scraped: 7,
        last_processed_url: None,
        timestamp: Utc::now(),
    });

    let policies: Vec<Box<dyn SitePolicy>> = ["alpha", "beta"]
        .iter()
        .map(|id| {
            build_policy(&SiteConfig::Listing(listing_site(
                id,
                format!("{}/{}", base_url, id),
            )))
            .unwrap()
        })
        .collect();

    let mut crawler = test_crawler(dir.path());
    let mut sink = MemorySink::default();
    let reports = crawler.run_sites(&policies, &mut sink).await.unwrap();

    let order: Vec<&str> = reports.iter().map(|r| r.site.as_str()).collect();
    assert_eq!(order, vec!["beta", "alpha"]);
    assert_eq!(reports[0].articles_total, 7);
    assert_eq!(reports[1].articles_total, 0);
    assert!(reports.iter().all(|r| r.outcome == SiteOutcome::Completed));
    assert!(store.load().is_none());
}
