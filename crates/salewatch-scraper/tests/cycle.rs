//! Integration tests for the batch scheduler, streaming emitter, and
//! per-brand orchestrator, all against local `wiremock` servers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use salewatch_core::{BrandConfig, Catalog, CountryOverrides, SaleCategoryDefinition};
use salewatch_scraper::{
    scrape_brand, CycleRunner, FailedBrandsCache, PageFetcher, ScrapeEvent, BLOCKED_MESSAGE,
};

fn categories() -> Vec<SaleCategoryDefinition> {
    vec![
        SaleCategoryDefinition {
            key: "flash-sale".to_string(),
            keywords: vec!["flash sale".to_string(), "today only".to_string()],
        },
        SaleCategoryDefinition {
            key: "clearance".to_string(),
            keywords: vec!["clearance".to_string()],
        },
    ]
}

fn brand(key: &str, server: &MockServer) -> BrandConfig {
    BrandConfig {
        key: key.to_string(),
        name: format!("Brand {key}"),
        url: format!("{}/brand/{key}", server.uri()),
        notes: None,
    }
}

/// Mounts a page for `key` with the given visible body text.
async fn mount_page(server: &MockServer, key: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/brand/{key}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("<html><body>{body}</body></html>")),
        )
        .mount(server)
        .await;
}

fn runner(server_catalog: Vec<BrandConfig>, group_size: usize, cooldown_ms: u64) -> CycleRunner {
    let fetcher = PageFetcher::new(5, "salewatch-test/0.1").expect("fetcher");
    let catalog = Arc::new(Catalog::new(server_catalog, CountryOverrides::default()));
    CycleRunner::new(
        fetcher,
        catalog,
        Arc::new(categories()),
        group_size,
        Duration::from_millis(cooldown_ms),
    )
}

#[tokio::test]
async fn twelve_brands_stream_in_three_groups() {
    let server = MockServer::start().await;

    let keys: Vec<String> = (0..12).map(|i| format!("brand-{i:02}")).collect();
    for (i, key) in keys.iter().enumerate() {
        let body = match i {
            0 => "Flash sale: up to 50% off today only",
            6 => "Clearance sale now on",
            9 => "Big sale this week",
            _ => "Plain catalog page",
        };
        mount_page(&server, key, body).await;
    }

    let catalog: Vec<BrandConfig> = keys.iter().map(|k| brand(k, &server)).collect();
    let runner = runner(catalog, 5, 10);

    let (tx, mut rx) = mpsc::channel(64);
    let outcome = runner.run_cycle(None, Some(tx)).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    // One brand-result per brand, in completion order.
    let brand_results: Vec<&ScrapeEvent> = events
        .iter()
        .filter(|e| matches!(e, ScrapeEvent::BrandResult(_)))
        .collect();
    assert_eq!(brand_results.len(), 12);

    // Three sales → three categorized snapshots.
    let updates = events
        .iter()
        .filter(|e| matches!(e, ScrapeEvent::CategorizedUpdate(_)))
        .count();
    assert_eq!(updates, 3);

    // Terminal event is last, exactly once, and carries every result.
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ScrapeEvent::Complete(_)))
            .count(),
        1
    );
    match events.last().expect("at least one event") {
        ScrapeEvent::Complete(summary) => {
            assert_eq!(summary.results.len(), brand_results.len());
            assert_eq!(summary.categorized_results.total(), 3);
        }
        other => panic!("terminal event must be Complete, got {other:?}"),
    }

    // Groups settle as barriers: results 0..5 are exactly the first five
    // catalog brands (in some completion order), and so on.
    for (group_index, window) in outcome.results.chunks(5).enumerate() {
        let got: HashSet<&str> = window.iter().map(|r| r.brand_key.as_str()).collect();
        let expected: HashSet<&str> = keys
            .iter()
            .skip(group_index * 5)
            .take(5)
            .map(String::as_str)
            .collect();
        assert_eq!(got, expected, "group {group_index} settled out of order");
    }

    assert_eq!(outcome.results.len(), 12);
    assert_eq!(outcome.categorized.bucket("flash-sale").map(<[_]>::len), Some(1));
    assert_eq!(outcome.categorized.bucket("clearance").map(<[_]>::len), Some(1));
    assert_eq!(outcome.categorized.bucket("other").map(<[_]>::len), Some(1));

    let flash = &outcome.categorized.bucket("flash-sale").unwrap()[0];
    assert_eq!(flash.sale_percentage.as_deref(), Some("50"));
}

#[tokio::test]
async fn inter_group_cooldown_applies_between_groups_only() {
    let server = MockServer::start().await;
    let keys: Vec<String> = (0..12).map(|i| format!("fast-{i:02}")).collect();
    for key in &keys {
        mount_page(&server, key, "Plain catalog page").await;
    }

    let catalog: Vec<BrandConfig> = keys.iter().map(|k| brand(k, &server)).collect();
    // 3 groups → exactly 2 cooldowns of 200ms.
    let runner = runner(catalog, 5, 200);

    let started = std::time::Instant::now();
    let outcome = runner.run_cycle(None, None).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.results.len(), 12);
    assert!(
        elapsed >= Duration::from_millis(400),
        "expected at least two 200ms cooldowns, elapsed {elapsed:?}"
    );
}

#[tokio::test]
async fn dropped_receiver_does_not_abort_the_cycle() {
    let server = MockServer::start().await;
    let keys: Vec<String> = (0..6).map(|i| format!("deaf-{i}")).collect();
    for key in &keys {
        mount_page(&server, key, "Clearance sale").await;
    }

    let catalog: Vec<BrandConfig> = keys.iter().map(|k| brand(k, &server)).collect();
    let runner = runner(catalog, 5, 10);

    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let outcome = runner.run_cycle(None, Some(tx)).await;
    assert_eq!(outcome.results.len(), 6);
    assert_eq!(outcome.categorized.total(), 6);
}

#[tokio::test]
async fn denylisted_brand_makes_zero_network_calls() {
    let server = MockServer::start().await;
    // kestrel is on the static denylist; no request may reach the server.
    let blocked = brand("kestrel", &server);
    mount_page(&server, "kestrel", "Flash sale: 90% off").await;

    let fetcher = PageFetcher::new(5, "salewatch-test/0.1").expect("fetcher");
    let failed = FailedBrandsCache::new();

    let result = scrape_brand(&fetcher, &categories(), &blocked, &blocked.url, &failed).await;

    assert!(!result.sale_found);
    assert_eq!(result.error.as_deref(), Some(BLOCKED_MESSAGE));
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "denylisted brand must not be fetched"
    );
}

#[tokio::test]
async fn failed_brand_short_circuits_for_the_rest_of_the_cycle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/brand/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let flaky = brand("flaky", &server);
    let fetcher = PageFetcher::new(5, "salewatch-test/0.1").expect("fetcher");
    let failed = FailedBrandsCache::new();

    let first = scrape_brand(&fetcher, &categories(), &flaky, &flaky.url, &failed).await;
    assert!(first.error.as_deref().unwrap().contains("503"));

    let second = scrape_brand(&fetcher, &categories(), &flaky, &flaky.url, &failed).await;
    assert_eq!(second.error.as_deref(), Some(BLOCKED_MESSAGE));

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn country_override_changes_the_fetched_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/brand/northglen/uk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>UK clearance</div>"))
        .expect(1)
        .mount(&server)
        .await;

    let b = brand("northglen", &server);
    let overrides = CountryOverrides::from_pairs(&[(
        "gb",
        "northglen",
        &format!("{}/brand/northglen/uk", server.uri()),
    )]);
    let catalog = Arc::new(Catalog::new(vec![b], overrides));
    let fetcher = PageFetcher::new(5, "salewatch-test/0.1").expect("fetcher");
    let runner = CycleRunner::new(
        fetcher,
        catalog,
        Arc::new(categories()),
        5,
        Duration::from_millis(10),
    );

    let outcome = runner.run_cycle(Some("gb"), None).await;
    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].sale_found);
    assert_eq!(outcome.country.as_deref(), Some("gb"));
    assert!(outcome.results[0].brand_url.ends_with("/uk"));
}
