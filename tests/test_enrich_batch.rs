//! End-to-end tests for bulk enrichment against mock RDAP and geolocation
//! endpoints.

use std::fs;
use std::path::Path;

use address_intel::{enrich_batch, enrich_one, EnrichmentConfig, ProgressTracker, Registry};
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_rule_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write rule file");
}

fn test_config(rules_dir: &Path, state_dir: &Path, server_uri: &str) -> EnrichmentConfig {
    EnrichmentConfig {
        rules_dir: rules_dir.to_path_buf(),
        registries: vec![Registry::Arin],
        throttle_seconds: 0.0,
        parallelism: 2,
        cache_path: state_dir.join("cache.json"),
        progress_path: state_dir.join("progress.json"),
        timeout_seconds: 5,
        rdap_base_url: Some(server_uri.to_string()),
        geo_base_url: Some(server_uri.to_string()),
        ..Default::default()
    }
}

async fn mount_rdap(server: &MockServer, address: &str, net_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/ip/{address}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "handle": format!("NET-{address}"),
            "name": net_name,
            "startAddress": "203.0.113.0",
            "endAddress": "203.0.113.255",
            "ipVersion": "v4",
            "type": "ASSIGNED",
            "port43": "whois.arin.net",
            "cidr0_cidrs": [ { "v4prefix": "203.0.113.0", "length": 24 } ]
        })))
        .mount(server)
        .await;
}

async fn mount_geo(server: &MockServer, address: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{address}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "United States",
            "countryCode": "US",
            "isp": "Example ISP",
            "as": "AS64500 EXAMPLE-AS",
            "reverse": "host.example.net"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_batch_enriches_all_extracted_addresses() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    write_rule_file(rules.path(), "shodan.nft", "ip saddr 203.0.113.1 drop\n");
    write_rule_file(rules.path(), "censys.nft", "ip saddr 203.0.113.2 drop\n");

    let server = MockServer::start().await;
    mount_rdap(&server, "203.0.113.1", "NET-ONE").await;
    mount_rdap(&server, "203.0.113.2", "NET-TWO").await;
    mount_geo(&server, "203.0.113.1").await;
    mount_geo(&server, "203.0.113.2").await;

    let config = test_config(rules.path(), state.path(), &server.uri());
    let cache_path = config.cache_path.clone();
    let progress_path = config.progress_path.clone();

    let report = enrich_batch(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.total_addresses, 2);
    assert_eq!(report.enriched, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);

    let one = report
        .records
        .iter()
        .find(|r| r.address == "203.0.113.1")
        .unwrap();
    assert_eq!(one.scanner_name, "shodan");
    assert_eq!(one.enrichment.net_name.as_deref(), Some("NET-ONE"));
    assert_eq!(one.enrichment.registry.as_deref(), Some("arin"));
    assert_eq!(one.enrichment.block.as_deref(), Some("203.0.113.0/24"));
    assert_eq!(one.enrichment.country_code.as_deref(), Some("US"));
    assert_eq!(one.enrichment.asn.as_deref(), Some("AS64500"));
    assert_eq!(
        one.enrichment.reverse_dns.as_deref(),
        Some("host.example.net")
    );
    assert_eq!(one.enrichment.domain.as_deref(), Some("example.net"));

    // Cache persisted, progress cleared after a clean finish
    assert!(cache_path.exists());
    assert!(!progress_path.exists());
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    write_rule_file(rules.path(), "shodan.nft", "ip saddr 203.0.113.7 drop\n");

    let server = MockServer::start().await;
    mount_rdap(&server, "203.0.113.7", "NET-SEVEN").await;
    mount_geo(&server, "203.0.113.7").await;

    let config = test_config(rules.path(), state.path(), &server.uri());

    let first = enrich_batch(config.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.enriched, 1);
    assert_eq!(first.cache_hits, 0);

    let second = enrich_batch(config, CancellationToken::new()).await.unwrap();
    assert_eq!(second.enriched, 0);
    assert_eq!(second.cache_hits, 1);
    let record = &second.records[0];
    assert_eq!(record.enrichment.net_name.as_deref(), Some("NET-SEVEN"));
}

#[tokio::test]
async fn test_single_lookup_shares_the_cache() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let server = MockServer::start().await;
    mount_rdap(&server, "203.0.113.9", "NET-NINE").await;
    mount_geo(&server, "203.0.113.9").await;

    let config = test_config(rules.path(), state.path(), &server.uri());

    let record = enrich_one("203.0.113.9", &config).await.unwrap();
    assert_eq!(record.enrichment.net_name.as_deref(), Some("NET-NINE"));
    assert_eq!(record.enrichment.country_code.as_deref(), Some("US"));

    // The lookup was cached; a repeat is served without touching the server
    server.reset().await;
    let cached = enrich_one("203.0.113.9", &config).await.unwrap();
    assert_eq!(cached.enrichment.net_name.as_deref(), Some("NET-NINE"));
}

#[tokio::test]
async fn test_cancelled_run_returns_partial_records() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    write_rule_file(
        rules.path(),
        "shodan.nft",
        "ip saddr 203.0.113.1 drop\nip saddr 203.0.113.2 drop\n",
    );

    let server = MockServer::start().await;
    let config = test_config(rules.path(), state.path(), &server.uri());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = enrich_batch(config, cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.enriched, 0);
    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.enrichment.is_empty()));
}

#[tokio::test]
async fn test_resumed_run_skips_processed_addresses() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    write_rule_file(rules.path(), "shodan.nft", "ip saddr 203.0.113.5 drop\n");

    let server = MockServer::start().await;
    // A resumed address must not hit the network at all
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(rules.path(), state.path(), &server.uri());

    let mut tracker = ProgressTracker::new(1, 2, 0.0);
    tracker.record_processed("203.0.113.5");
    tracker.save(&config.progress_path).unwrap();

    let report = enrich_batch(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.resumed, 1);
    assert_eq!(report.enriched, 0);
}

#[tokio::test]
async fn test_unwritable_cache_path_fails_the_run() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    write_rule_file(rules.path(), "shodan.nft", "ip saddr 203.0.113.4 drop\n");

    let server = MockServer::start().await;
    mount_rdap(&server, "203.0.113.4", "NET-FOUR").await;
    mount_geo(&server, "203.0.113.4").await;

    let mut config = test_config(rules.path(), state.path(), &server.uri());
    // A directory at the cache path makes every save fail
    config.cache_path = state.path().to_path_buf();

    let result = enrich_batch(config, CancellationToken::new()).await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("persist"), "unexpected error: {message}");
}

#[tokio::test]
async fn test_single_lookup_fails_when_cache_cannot_be_saved() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let server = MockServer::start().await;
    mount_rdap(&server, "203.0.113.6", "NET-SIX").await;
    mount_geo(&server, "203.0.113.6").await;

    let mut config = test_config(rules.path(), state.path(), &server.uri());
    config.cache_path = state.path().to_path_buf();

    let result = enrich_one("203.0.113.6", &config).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_large_batch_persists_every_address_to_the_cache() {
    let rules = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let mut content = String::new();
    let mut addresses = Vec::new();
    for i in 10..20 {
        let address = format!("203.0.113.{i}");
        content.push_str(&format!("ip saddr {address} drop\n"));
        addresses.push(address);
    }
    write_rule_file(rules.path(), "shodan.nft", &content);

    let server = MockServer::start().await;
    for address in &addresses {
        mount_rdap(&server, address, "NET-BULK").await;
        mount_geo(&server, address).await;
    }

    let config = test_config(rules.path(), state.path(), &server.uri());
    let cache_path = config.cache_path.clone();

    let report = enrich_batch(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.enriched, 10);

    let cache: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&cache_path).unwrap()).unwrap();
    let entries = cache["entries"].as_object().unwrap();
    assert_eq!(entries.len(), 10);
    for address in &addresses {
        assert!(entries.contains_key(address), "missing cache entry: {address}");
    }
}
