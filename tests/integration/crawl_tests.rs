//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use shoreline::config::Config;
use shoreline::crawler::{run_crawl, Coordinator};
use shoreline::state::PageState;
use shoreline::storage::sanitize_key;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seed` into `html_dir`
fn create_test_config(seed: &str, html_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = Some(seed.to_string());
    config.crawler.min_interval_ms = 10; // Very short for testing
    config.crawler.max_concurrent = 2;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.html_dir = html_dir.to_string_lossy().into_owned();
    config
}

/// Mounts an HTML page expected to be fetched `times` times
async fn mount_page(server: &MockServer, page: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Sorted names of the files saved in `dir`
fn saved_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Expected file names for the given paths on `server`
fn expected_files(server: &MockServer, paths: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| sanitize_key(&format!("{}{}", server.uri(), p)))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_self_link_fetched_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/a",
        r#"<html><body><a href="/b">B</a><a href="/a">Self</a></body></html>"#,
        1,
    )
    .await;
    mount_page(&server, "/b", r#"<a href="/a">Back</a><a href="/a#top">Top</a>"#, 1).await;

    let config = create_test_config(&format!("{}/a", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(saved_files(dir.path()), expected_files(&server, &["/a", "/b"]));
    assert_eq!(stats.count(PageState::Persisted), 2);
    assert!(!stats.timed_out);
}

#[tokio::test]
async fn test_server_error_does_not_stop_siblings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/c">C</a><a href="/d">D</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/d", r#"<a href="/e">E</a>"#, 1).await;
    mount_page(&server, "/e", "leaf", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        expected_files(&server, &["/", "/d", "/e"])
    );
    assert_eq!(stats.count(PageState::Failed), 1);
}

#[tokio::test]
async fn test_robots_disallow_respected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private">Private</a><a href="/public">Public</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/private", "secret", 0).await;
    mount_page(&server, "/public", "open", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        expected_files(&server, &["/", "/public"])
    );
    assert_eq!(stats.count(PageState::RobotsDenied), 1);
}

#[tokio::test]
async fn test_robots_rules_for_product_token() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: TestBot\nDisallow: /bots-keep-out\n\nUser-agent: *\nAllow: /"),
    )
    .await;
    mount_page(&server, "/", r#"<a href="/bots-keep-out">No</a>"#, 1).await;
    mount_page(&server, "/bots-keep-out", "hidden", 0).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    run_crawl(config).await.unwrap();

    assert_eq!(saved_files(dir.path()), expected_files(&server, &["/"]));
}

#[tokio::test]
async fn test_robots_failure_fails_open() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(500)).await;
    mount_page(&server, "/", r#"<a href="/private">Private</a>"#, 1).await;
    mount_page(&server, "/private", "reachable", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    run_crawl(config).await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        expected_files(&server, &["/", "/private"])
    );
}

#[tokio::test]
async fn test_redirect_into_disallowed_path() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
    )
    .await;
    mount_page(&server, "/", r#"<a href="/go">Go</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/secret"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/private/secret", "SECRET", 0).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(saved_files(dir.path()), expected_files(&server, &["/"]));
    assert_eq!(stats.count(PageState::Redirected), 1);
    assert_eq!(stats.count(PageState::RobotsDenied), 1);
}

#[tokio::test]
async fn test_redirect_target_paced_and_saved_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/old">Old</a><a href="/new">New</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new", "moved here", 1).await;

    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.crawler.max_concurrent = 1;
    config.crawler.min_interval_ms = 100;
    let started = Instant::now();
    run_crawl(config).await.unwrap();

    // robots.txt, "/", "/old" and "/new" each take their own turn
    assert!(started.elapsed() >= Duration::from_millis(290));
    assert_eq!(saved_files(dir.path()), expected_files(&server, &["/", "/new"]));
}

#[tokio::test]
async fn test_other_origin_not_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/page">Elsewhere</a><a href="/local">Local</a>"#, other.uri()),
        1,
    )
    .await;
    mount_page(&server, "/local", "here", 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&other)
        .await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        expected_files(&server, &["/", "/local"])
    );
    assert_eq!(stats.count(PageState::OutOfScope), 1);
}

#[tokio::test]
async fn test_scope_prefix_narrows_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/docs/",
        r#"<a href="intro">Intro</a><a href="/blog">Blog</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/docs/intro", "intro", 1).await;
    mount_page(&server, "/blog", "blog", 0).await;

    let mut config = create_test_config(&format!("{}/docs/", server.uri()), dir.path());
    config.crawler.scope_prefix = Some(format!("{}/docs", server.uri()));
    run_crawl(config).await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        expected_files(&server, &["/docs/", "/docs/intro"])
    );
}

#[tokio::test]
async fn test_manifest_records_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let html_dir = dir.path().join("html");
    let manifest_path = dir.path().join("manifest.db");

    mount_page(&server, "/", r#"<a href="/missing">Missing</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()), &html_dir);
    config.output.manifest_path = Some(manifest_path.to_string_lossy().into_owned());
    run_crawl(config).await.unwrap();

    let conn = rusqlite::Connection::open(&manifest_path).unwrap();
    let mut stmt = conn
        .prepare("SELECT url, state, file_name, status_code FROM pages ORDER BY url")
        .unwrap();
    let rows: Vec<(String, String, Option<String>, Option<u16>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .unwrap()
        .map(|row| row.unwrap())
        .collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].1, "persisted");
    assert_eq!(
        rows[0].2.as_deref(),
        Some(sanitize_key(&format!("{}/", server.uri())).as_str())
    );
    assert_eq!(rows[1].0, format!("{}/missing", server.uri()));
    assert_eq!(rows[1].1, "failed");
    assert_eq!(rows[1].3, Some(404));
}

#[tokio::test]
async fn test_crawl_delay_slows_requests() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 0.2"),
    )
    .await;
    mount_page(&server, "/", r#"<a href="/next">Next</a>"#, 1).await;
    mount_page(&server, "/next", "leaf", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let started = Instant::now();
    run_crawl(config).await.unwrap();

    // robots.txt, "/" and "/next" start at least 200ms apart
    assert!(started.elapsed() >= Duration::from_millis(390));
}

#[tokio::test]
async fn test_time_limit_stops_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.crawler.max_duration_secs = Some(1);

    let started = Instant::now();
    let stats = Coordinator::new(config).await.unwrap().run().await.unwrap();

    assert!(stats.timed_out);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(saved_files(dir.path()).is_empty());
}
