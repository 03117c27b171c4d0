//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::time::Duration;
use sumi_crawl::config::{CompletionMode, Config};
use sumi_crawl::crawler::{crawl, FetchError, VisitError};
use sumi_crawl::output::PrinterKind;
use sumi_crawl::state::CompletionReason;
use sumi_crawl::storage::{open_store, PageStore, StorageBackend};
use sumi_crawl::{CrawlError, CrawlReport};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given server to completion
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::new(base_url);
    config.crawler.http_timeout = 2_000;
    config.crawler.idle_timeout = 500;
    config.crawler.completion = CompletionMode::Outstanding;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a small site: / -> page1, page2; page1 -> page2, external;
/// page2 -> missing (404)
async fn mount_site(server: &MockServer) {
    let base_url = server.uri();

    mount_page(
        server,
        "/",
        &format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2?ref=home">Page 2</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    mount_page(
        server,
        "/page1/",
        r#"<html><body>
        <a href="/page2">Page 2 again</a>
        <a href="https://external.example.org/elsewhere">External</a>
        <a href="/cdn-cgi/l/email-protection">Email</a>
        </body></html>"#,
    )
    .await;

    mount_page(
        server,
        "/page2/",
        r#"<html><body><a href="/missing">Gone</a></body></html>"#,
    )
    .await;
}

fn sorted_paths(report: &CrawlReport) -> Vec<String> {
    let mut paths: Vec<String> = report
        .pages
        .iter()
        .map(|p| p.address.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let config = create_test_config(&server.uri());
    let report = crawl(&config, false, CancellationToken::new())
        .await
        .expect("crawl should start");

    assert_eq!(report.reason, CompletionReason::Exhausted);
    assert_eq!(sorted_paths(&report), vec!["/missing/", "/page1/", "/page2/"]);

    // Each page is admitted exactly once, from the first page that found it
    let page2 = report
        .pages
        .iter()
        .find(|p| p.address.path() == "/page2/")
        .unwrap();
    assert_eq!(page2.referrer.path(), "/");
    assert!(page2.address.query().is_none());

    let missing = report
        .pages
        .iter()
        .find(|p| p.address.path() == "/missing/")
        .unwrap();
    assert_eq!(missing.referrer.path(), "/page2/");

    let errors = report.error.expect("the 404 is reported");
    assert_eq!(errors.len(), 1);
    let first = errors.iter().next();
    match first {
        Some(VisitError::Fetch { address, source }) => {
            assert_eq!(address.path(), "/missing/");
            assert_eq!(*source, FetchError::UnacceptableStatus(404));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_idle_completion() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.completion = CompletionMode::Idle;
    config.crawler.http_timeout = 200;
    config.crawler.idle_timeout = 300;

    let report = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.reason, CompletionReason::Idle);
    assert_eq!(sorted_paths(&report), vec!["/missing/", "/page1/", "/page2/"]);
}

#[tokio::test]
async fn test_seed_not_found() {
    let server = MockServer::start().await;

    let config = create_test_config(&server.uri());
    let report = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.pages.is_empty());
    assert_eq!(report.error_count(), 1);
}

#[tokio::test]
async fn test_non_ok_success_status_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let report = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.pages.is_empty());
    assert!(matches!(
        report.error.unwrap().iter().next(),
        Some(VisitError::Fetch {
            source: FetchError::UnacceptableStatus(204),
            ..
        })
    ));
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawler.http_timeout = 200;

    let report = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sorted_paths(&report), vec!["/slow/"]);
    assert!(matches!(
        report.error.unwrap().iter().next(),
        Some(VisitError::Fetch {
            source: FetchError::Timeout,
            ..
        })
    ));
}

#[tokio::test]
async fn test_idle_seed_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawler.completion = CompletionMode::Idle;
    config.crawler.http_timeout = 200;
    config.crawler.idle_timeout = 600;

    // Repeated because losing the failure depended on timer ordering
    for _ in 0..3 {
        let report = crawl(&config, false, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.reason, CompletionReason::Idle);
        assert!(report.pages.is_empty());
        let errors = report.error.expect("the seed timeout is reported");
        assert!(matches!(
            errors.iter().next(),
            Some(VisitError::Fetch {
                source: FetchError::Timeout,
                ..
            })
        ));
    }
}

#[tokio::test]
async fn test_http_timeout_outlasting_idle_window_rejected() {
    let server = MockServer::start().await;

    let mut config = create_test_config(&server.uri());
    config.crawler.completion = CompletionMode::Idle;
    config.crawler.http_timeout = 400;
    config.crawler.idle_timeout = 400;

    let result = crawl(&config, false, CancellationToken::new()).await;
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn test_cancel_before_start() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(&server.uri());
    let report = crawl(&config, false, cancel).await.unwrap();

    assert_eq!(report.reason, CompletionReason::Cancelled);
    assert!(report.pages.is_empty());
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_sqlite_backend_persists_pages() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri());
    config.storage.backend = StorageBackend::Sqlite;
    config.storage.database_path = dir.path().join("crawl.db");

    let first = crawl(&config, true, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.pages.len(), 3);

    let store = open_store(&config.storage, false).unwrap();
    assert_eq!(store.count().unwrap(), 3);
    drop(store);

    // Without --fresh every page is already known, so nothing new is admitted
    let second = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();
    assert!(second.pages.is_empty());

    let third = crawl(&config, true, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(third.pages.len(), 3);
}

#[tokio::test]
async fn test_render_and_persist_json() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri());
    let report = crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    let printer = PrinterKind::Json.printer();
    let rendered = printer.render(&report.pages).unwrap();
    let written = printer.persist(&rendered, dir.path()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        assert_eq!(entry["url"]["scheme"], "http");
        assert_eq!(entry["url"]["rawQuery"], "");
        assert!(entry["crawledAt"].is_string());
    }
}
