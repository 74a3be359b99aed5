//! Address extraction from rule files.
//!
//! Walks a root directory for `.nft` rule files and pulls out every IPv4/IPv6
//! literal or CIDR block, deduplicated across all files in first-seen order.
//! Regexes find candidates; `std::net` parsing validates them, so `2:30:45`
//! in a timeout clause never comes back as an address.

pub mod sources;

pub use sources::{SourceInfo, SourceMap};

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::config::{COMMENT_PREFIX, RULE_FILE_EXTENSION};
use crate::error_handling::EnrichmentError;

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}(?:/\d{1,2})?\b").expect("valid IPv4 pattern")
    })
}

fn ipv6_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Candidate matcher only; every hit is re-validated with Ipv6Addr parsing.
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:[0-9a-fA-F]{0,4}:){2,}[0-9a-fA-F:]*(?:/\d{1,3})?")
            .expect("valid IPv6 pattern")
    })
}

/// Validates an IPv4 candidate (optionally with a `/prefix`).
fn is_valid_ipv4(candidate: &str) -> bool {
    let (addr, prefix) = match candidate.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (candidate, None),
    };
    if addr.parse::<Ipv4Addr>().is_err() {
        return false;
    }
    match prefix {
        Some(p) => p.parse::<u8>().map(|n| n <= 32).unwrap_or(false),
        None => true,
    }
}

/// Validates an IPv6 candidate (optionally with a `/prefix`).
fn is_valid_ipv6(candidate: &str) -> bool {
    let (addr, prefix) = match candidate.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (candidate, None),
    };
    if addr.parse::<Ipv6Addr>().is_err() {
        return false;
    }
    match prefix {
        Some(p) => p.parse::<u8>().map(|n| n <= 128).unwrap_or(false),
        None => true,
    }
}

/// Extracts every valid address literal from one line, in match order.
pub(crate) fn extract_from_line(line: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in ipv4_pattern().find_iter(line) {
        if is_valid_ipv4(m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    for m in ipv6_pattern().find_iter(line) {
        let candidate = m.as_str().trim_end_matches(':');
        // Compressed forms legitimately end in "::"; restore it if trimming
        // took the whole compression marker away.
        let candidate = if m.as_str().ends_with("::") && !candidate.contains("::") {
            &m.as_str()[..candidate.len() + 2]
        } else {
            candidate
        };
        if is_valid_ipv6(candidate) {
            found.push(candidate.to_string());
        }
    }
    found
}

/// Collects the rule files under `root`, sorted by path for a deterministic
/// walk order. Hidden directories (name starts with `.`) are skipped.
pub fn collect_rule_files(root: &Path) -> Result<Vec<PathBuf>, EnrichmentError> {
    if !root.is_dir() {
        return Err(EnrichmentError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // Skip hidden directories, but never the root itself
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with('.'))
                    .unwrap_or(false))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map(|ext| ext == RULE_FILE_EXTENSION)
                .unwrap_or(false)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Extracts all candidate addresses under `root`.
///
/// Addresses are deduplicated by exact string equality, preserving first-seen
/// order across the (sorted) file walk. A file that cannot be read is logged
/// and skipped; only a missing root directory fails the call.
pub fn extract_addresses(root: &Path) -> Result<Vec<String>, EnrichmentError> {
    let files = collect_rule_files(root)?;
    debug!("Found {} rule files under {}", files.len(), root.display());

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for path in &files {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read rule file {}: {e}", path.display());
                continue;
            }
        };
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }
            for address in extract_from_line(trimmed) {
                if seen.insert(address.clone()) {
                    addresses.push(address);
                }
            }
        }
    }

    debug!(
        "Extracted {} unique addresses from {} files",
        addresses.len(),
        files.len()
    );
    Ok(addresses)
}
