//! Persistent result cache.
//!
//! Maps address text to an [`EnrichmentSnapshot`] plus a `cached_at`
//! timestamp, serialized as one JSON file. Entries older than the configured
//! TTL are evicted lazily when the cache is loaded; there is no background
//! timer. During a run all mutation goes through a single mutex-guarded
//! owner (see the orchestrator), never through the raw map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error_handling::EnrichmentError;
use crate::models::{AddressRecord, EnrichmentSnapshot};

/// One cached enrichment snapshot with its write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The enrichment data as last written.
    pub snapshot: EnrichmentSnapshot,
    /// When the entry was written; drives TTL eviction.
    pub cached_at: DateTime<Utc>,
}

/// On-disk shape of the cache file. Format is internal and may change between
/// versions; field names are stable within a version.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: HashMap<String, CacheEntry>,
}

/// The result cache for one run.
pub struct ResultCache {
    path: PathBuf,
    ttl_hours: i64,
    entries: HashMap<String, CacheEntry>,
}

impl ResultCache {
    /// Loads the cache from `path`, evicting entries older than `ttl_hours`.
    ///
    /// A missing or unreadable file yields an empty cache; load never fails
    /// the caller.
    pub fn load(path: &Path, ttl_hours: i64) -> ResultCache {
        let mut cache = ResultCache {
            path: path.to_path_buf(),
            ttl_hours,
            entries: HashMap::new(),
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", path.display());
                return cache;
            }
            Err(e) => {
                warn!(
                    "Failed to read cache file {}, starting empty: {e}",
                    path.display()
                );
                return cache;
            }
        };

        let file: CacheFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Failed to parse cache file {}, starting empty: {e}",
                    path.display()
                );
                return cache;
            }
        };

        let cutoff = Utc::now() - Duration::hours(ttl_hours);
        let before = file.entries.len();
        cache.entries = file
            .entries
            .into_iter()
            .filter(|(_, entry)| entry.cached_at > cutoff)
            .collect();
        let evicted = before - cache.entries.len();
        if evicted > 0 {
            debug!(
                "Evicted {evicted} cache entries older than {ttl_hours}h from {}",
                path.display()
            );
        }
        cache
    }

    /// Returns the cached snapshot for an address, if present.
    pub fn lookup(&self, address: &str) -> Option<&EnrichmentSnapshot> {
        self.entries.get(address).map(|entry| &entry.snapshot)
    }

    /// Copies cached fields onto `record` on a hit. Returns the hit flag.
    pub fn apply_to(&self, record: &mut AddressRecord) -> bool {
        match self.lookup(&record.address) {
            Some(snapshot) => {
                let snapshot = snapshot.clone();
                record.apply_snapshot(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Writes/overwrites the entry for `record` with its current enrichment
    /// fields and a fresh timestamp.
    pub fn update(&mut self, record: &AddressRecord) {
        self.entries.insert(
            record.address.clone(),
            CacheEntry {
                snapshot: record.enrichment.clone(),
                cached_at: Utc::now(),
            },
        );
    }

    /// Renders the full map as the cache file's JSON body, for callers that
    /// write the file themselves.
    pub fn serialize(&self) -> Result<String, EnrichmentError> {
        let file = CacheFile {
            entries: self.entries.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| EnrichmentError::CacheSave {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    /// Serializes the full map back to disk, overwriting the previous file.
    pub fn save(&self) -> Result<(), EnrichmentError> {
        let content = self.serialize()?;
        std::fs::write(&self.path, content).map_err(|e| EnrichmentError::CacheSave {
            path: self.path.clone(),
            source: e,
        })
    }

    /// The file this cache was loaded from and saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of fresh entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The TTL this cache was loaded with.
    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }

    #[cfg(test)]
    fn insert_raw(&mut self, address: &str, entry: CacheEntry) {
        self.entries.insert(address.to_string(), entry);
    }
}
