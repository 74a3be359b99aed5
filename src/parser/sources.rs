//! Source mapping: which rule file an address came from.
//!
//! Re-walks the rule-file set and associates each address with its scanner
//! name (file base name), classification, and source file. When the same
//! address appears in multiple files, the first file in the sorted walk order
//! wins; the walk is sorted precisely so this choice is deterministic across
//! platforms.

use std::collections::HashMap;
use std::path::Path;

use log::warn;

use crate::config::COMMENT_PREFIX;
use crate::error_handling::EnrichmentError;
use crate::models::{AddressRecord, ScannerKind};
use crate::parser::{collect_rule_files, extract_from_line};

/// Origin of one extracted address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Rule file base name without extension.
    pub scanner_name: String,
    /// Known-scanner classification for that name.
    pub scanner_kind: ScannerKind,
    /// Rule file name with extension.
    pub source_file: String,
}

/// Mapping from address text to its originating rule file.
#[derive(Debug, Default)]
pub struct SourceMap {
    entries: HashMap<String, SourceInfo>,
}

impl SourceMap {
    /// Builds the mapping by walking the rule files under `root`.
    ///
    /// First-wins: an address already mapped keeps its original source even
    /// when later files repeat it.
    pub fn build(root: &Path) -> Result<SourceMap, EnrichmentError> {
        let files = collect_rule_files(root)?;
        let mut entries = HashMap::new();

        for path in &files {
            let scanner_name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            let source_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            let scanner_kind = ScannerKind::from_name(&scanner_name);

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
                    entries.entry(address).or_insert_with(|| SourceInfo {
                        scanner_name: scanner_name.clone(),
                        scanner_kind,
                        source_file: source_file.clone(),
                    });
                }
            }
        }

        Ok(SourceMap { entries })
    }

    /// Source info for one address, if it was seen in any rule file.
    pub fn get(&self, address: &str) -> Option<&SourceInfo> {
        self.entries.get(address)
    }

    /// Number of mapped addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no addresses were mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the source fields onto a record, if the address is mapped.
    pub fn apply(&self, record: &mut AddressRecord) {
        if let Some(info) = self.get(&record.address) {
            record.scanner_name = info.scanner_name.clone();
            record.scanner_kind = info.scanner_kind;
            record.source_file = info.source_file.clone();
        }
    }
}
