//! Integration tests for address extraction and source mapping.

use std::fs;
use std::path::Path;

use address_intel::{extract_addresses, ScannerKind, SourceMap};
use tempfile::TempDir;

fn write_rule_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write rule file");
}

#[test]
fn test_disjoint_files_extract_all_addresses() {
    let dir = TempDir::new().unwrap();
    // 100 files, one unique address each
    for i in 0..100 {
        write_rule_file(
            dir.path(),
            &format!("scanner{i:03}.nft"),
            &format!("ip saddr 198.51.{}.{} drop\n", i / 256, i % 256),
        );
    }

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses.len(), 100);
}

#[test]
fn test_fully_overlapping_files_extract_once() {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        write_rule_file(
            dir.path(),
            &format!("scanner{i}.nft"),
            "ip saddr 198.51.100.7 drop\n",
        );
    }

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses, vec!["198.51.100.7".to_string()]);
}

#[test]
fn test_comments_and_blank_lines_are_ignored() {
    let dir = TempDir::new().unwrap();
    write_rule_file(
        dir.path(),
        "shodan.nft",
        "# blocklist for 203.0.113.99\n\n\
         ip saddr 203.0.113.1 drop\n\
         # 203.0.113.2 disabled for now\n\
         ip6 saddr 2001:db8::1 drop\n",
    );

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses, vec!["203.0.113.1", "2001:db8::1"]);
}

#[test]
fn test_cidr_blocks_and_timeouts() {
    let dir = TempDir::new().unwrap();
    write_rule_file(
        dir.path(),
        "censys.nft",
        "ip saddr 192.0.2.0/24 drop\n\
         ip saddr 999.1.1.1 drop\n\
         ct timeout 2:30:45 accept\n\
         ip6 saddr 2001:db8::/32 drop\n",
    );

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses, vec!["192.0.2.0/24", "2001:db8::/32"]);
}

#[test]
fn test_non_rule_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_rule_file(dir.path(), "shodan.nft", "ip saddr 203.0.113.1 drop\n");
    write_rule_file(dir.path(), "notes.txt", "ip saddr 203.0.113.2 drop\n");
    write_rule_file(dir.path(), "README.md", "203.0.113.3\n");

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses, vec!["203.0.113.1"]);
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(extract_addresses(&missing).is_err());
}

#[test]
fn test_source_map_classifies_known_scanners() {
    let dir = TempDir::new().unwrap();
    write_rule_file(dir.path(), "shodan.nft", "ip saddr 203.0.113.1 drop\n");
    write_rule_file(dir.path(), "custom-feed.nft", "ip saddr 203.0.113.2 drop\n");

    let sources = SourceMap::build(dir.path()).unwrap();

    let shodan = sources.get("203.0.113.1").unwrap();
    assert_eq!(shodan.scanner_name, "shodan");
    assert_eq!(shodan.scanner_kind, ScannerKind::Shodan);
    assert_eq!(shodan.source_file, "shodan.nft");

    let custom = sources.get("203.0.113.2").unwrap();
    assert_eq!(custom.scanner_name, "custom-feed");
    assert_eq!(custom.scanner_kind, ScannerKind::Other);
}

#[test]
fn test_overlapping_scanner_feeds_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_rule_file(dir.path(), "shodan.nft", "ip saddr 198.20.69.74 drop\n");
    write_rule_file(
        dir.path(),
        "censys.nft",
        "ip saddr 198.20.69.74 drop\nip saddr 162.142.125.10 drop\n",
    );

    let addresses = extract_addresses(dir.path()).unwrap();
    assert_eq!(addresses.len(), 2);
    assert!(addresses.contains(&"198.20.69.74".to_string()));
    assert!(addresses.contains(&"162.142.125.10".to_string()));

    // The shared address is attributed to the first file in sorted walk order
    let sources = SourceMap::build(dir.path()).unwrap();
    assert_eq!(sources.get("198.20.69.74").unwrap().scanner_name, "censys");
    assert_eq!(
        sources.get("162.142.125.10").unwrap().scanner_name,
        "censys"
    );
}

#[test]
fn test_source_map_first_file_in_sorted_order_wins() {
    let dir = TempDir::new().unwrap();
    // "censys.nft" sorts before "shodan.nft"
    write_rule_file(dir.path(), "shodan.nft", "ip saddr 203.0.113.9 drop\n");
    write_rule_file(dir.path(), "censys.nft", "ip saddr 203.0.113.9 drop\n");

    let sources = SourceMap::build(dir.path()).unwrap();
    let info = sources.get("203.0.113.9").unwrap();
    assert_eq!(info.scanner_name, "censys");
}
