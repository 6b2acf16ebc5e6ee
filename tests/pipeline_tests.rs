//! Integration tests for the discovery and dispatch pipeline
//!
//! These tests use wiremock to create mock sitemap servers and exercise the
//! full pass end-to-end: walk, persist, dispatch, acknowledge, re-dispatch.

use chrono::Utc;
use sitemap_scout::config::{Config, DiscoveryConfig, DispatchConfig, SiteEntry, StoreConfig};
use sitemap_scout::dispatch::{DeltaDispatcher, SqliteQueue, WorkQueue};
use sitemap_scout::identity::fingerprint;
use sitemap_scout::pipeline::run_discovery;
use sitemap_scout::store::{SqliteStore, UrlStore};
use std::collections::HashMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at one mock site
fn create_test_config(base_url: &str, sitemap_urls: Vec<String>, filter: Option<String>) -> Config {
    Config {
        discovery: DiscoveryConfig {
            max_depth: 3,
            max_concurrent_fetches: 4,
            fetch_timeout_secs: 5,
            user_agent: "SitemapScout-Test/0.3".to_string(),
        },
        store: StoreConfig {
            // In-memory stores are opened directly by the tests.
            database_path: ":memory:".to_string(),
        },
        dispatch: DispatchConfig {
            interval_secs: 600,
            queue_path: ":memory:".to_string(),
        },
        sites: vec![SiteEntry {
            id: "mock-site".to_string(),
            base_url: base_url.to_string(),
            sitemap_urls,
            filter,
            headers: HashMap::new(),
        }],
    }
}

async fn mount_xml(server: &MockServer, p: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", "application/xml"),
        )
        .mount(server)
        .await;
}

fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    format!(
        r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|u| format!("<sitemap><loc>{}</loc></sitemap>", u))
        .collect();
    format!(
        r#"<?xml version="1.0"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

#[tokio::test]
async fn test_discover_persist_dispatch_acknowledge_roundtrip() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        index(&[format!("{}/products.xml", base_url)]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/products.xml",
        urlset(&[
            format!("{}/product/hat", base_url),
            format!("{}/product/mug", base_url),
        ]),
    )
    .await;

    let config = create_test_config(&base_url, vec!["sitemap_index.xml".to_string()], None);
    let mut store = SqliteStore::new_in_memory().unwrap();

    // Discovery pass lands both product URLs.
    let report = run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(report.urls_discovered, 2);
    assert_eq!(report.inserted, 2);
    assert!(!report.has_failures());
    assert_eq!(store.count_pending().unwrap(), 2);

    // First dispatch cycle publishes the whole delta.
    let queue = SqliteQueue::new_in_memory().unwrap();
    let mut dispatcher = DeltaDispatcher::new(store, queue);
    let cycle = dispatcher.run_cycle().unwrap();
    assert_eq!(cycle.published, 2);

    let (mut store, mut queue) = dispatcher.into_parts();
    let first = queue.pop_next().unwrap().unwrap();
    assert_eq!(first.row_key, fingerprint(&first.url));

    // Consumer acknowledges one URL; the next cycle only re-sends the other.
    store.mark_crawled(&first.row_key, Utc::now()).unwrap();
    let mut dispatcher = DeltaDispatcher::new(store, queue);
    let cycle = dispatcher.run_cycle().unwrap();
    assert_eq!(cycle.pending, 1);
    assert_eq!(cycle.published, 1);

    let (_, mut queue) = dispatcher.into_parts();
    let second = queue.pop_next().unwrap().unwrap();
    assert_ne!(second.row_key, first.row_key);
}

#[tokio::test]
async fn test_filter_limits_discovery_to_matching_subtree() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        index(&[
            format!("{}/pages.xml", base_url),
            format!("{}/products-1.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/pages.xml",
        urlset(&[format!("{}/about", base_url)]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/products-1.xml",
        urlset(&[format!("{}/product/hat", base_url)]),
    )
    .await;

    let config = create_test_config(
        &base_url,
        vec!["sitemap_index.xml".to_string()],
        Some("product".to_string()),
    );
    let mut store = SqliteStore::new_in_memory().unwrap();

    let report = run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(report.urls_discovered, 1);

    let pending = store.query_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].url.ends_with("/product/hat"));
}

#[tokio::test]
async fn test_partial_sitemap_failure_reported_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        index(&[
            format!("{}/good.xml", base_url),
            format!("{}/broken.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/good.xml",
        urlset(&[format!("{}/product/hat", base_url)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, vec!["sitemap_index.xml".to_string()], None);
    let mut store = SqliteStore::new_in_memory().unwrap();

    let report = run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(report.urls_discovered, 1);
    assert_eq!(report.nodes_failed, 1);
    assert!(report.has_failures());
    assert_eq!(store.count_records().unwrap(), 1);
}

#[tokio::test]
async fn test_second_discovery_pass_is_idempotent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/products.xml",
        urlset(&[format!("{}/product/hat", base_url)]),
    )
    .await;

    let config = create_test_config(&base_url, vec!["products.xml".to_string()], None);
    let mut store = SqliteStore::new_in_memory().unwrap();

    let first = run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(first.inserted, 1);

    let second = run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.refreshed, 1);
    assert_eq!(store.count_records().unwrap(), 1);
}

#[tokio::test]
async fn test_crawled_then_rediscovered_url_is_dispatched_again() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let product_url = format!("{}/product/hat", base_url);
    mount_xml(&mock_server, "/products.xml", urlset(&[product_url.clone()])).await;

    let config = create_test_config(&base_url, vec!["products.xml".to_string()], None);
    let mut store = SqliteStore::new_in_memory().unwrap();

    run_discovery(&config, &mut store).await.unwrap();
    store
        .mark_crawled(&fingerprint(&product_url), Utc::now())
        .unwrap();
    assert_eq!(store.count_pending().unwrap(), 0);

    // The sitemap still lists the URL, so the next pass re-queues it.
    run_discovery(&config, &mut store).await.unwrap();
    assert_eq!(store.count_pending().unwrap(), 1);

    let mut queue = SqliteQueue::new_in_memory().unwrap();
    let pending = store.query_pending().unwrap();
    for record in &pending {
        queue
            .publish(&sitemap_scout::dispatch::WorkItem {
                url: record.url.clone(),
                row_key: record.fingerprint.clone(),
            })
            .unwrap();
    }
    assert_eq!(queue.len().unwrap(), 1);
}
