//! Persistent progress tracking for bulk runs.
//!
//! Records which addresses have completed enrichment so an interrupted run
//! can resume where it left off. The on-disk file is JSON; the in-memory
//! tracker keeps a hash set alongside the ordered list for O(1) membership
//! checks. The orchestrator persists every few completions and clears the
//! file once a run finishes.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error_handling::EnrichmentError;

/// Progress state for one bulk enrichment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressTracker {
    /// Total number of addresses in the run.
    pub total: usize,
    /// Number of addresses that completed enrichment.
    pub processed_count: usize,
    /// Addresses that completed, in completion order.
    pub processed: Vec<String>,
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When progress was last recorded.
    pub updated_at: Option<DateTime<Utc>>,
    /// Worker count the run was started with.
    pub workers: usize,
    /// Throttle value the run was started with.
    pub throttle_seconds: f64,
    /// True once the run drained its queue normally.
    pub completed: bool,

    #[serde(skip)]
    processed_set: HashSet<String>,
}

impl ProgressTracker {
    /// Fresh tracker for a new run.
    pub fn new(total: usize, workers: usize, throttle_seconds: f64) -> Self {
        ProgressTracker {
            total,
            started_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            workers,
            throttle_seconds,
            ..Default::default()
        }
    }

    /// Loads the tracker from disk, defaulting to an empty one if the file is
    /// absent or unreadable. Never fails the caller.
    pub fn load(path: &Path) -> ProgressTracker {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to read progress file {}, starting fresh: {e}",
                        path.display()
                    );
                }
                return ProgressTracker::default();
            }
        };
        match serde_json::from_str::<ProgressTracker>(&content) {
            Ok(mut tracker) => {
                tracker.rebuild_index();
                debug!(
                    "Loaded progress: {}/{} processed, completed={}",
                    tracker.processed_count, tracker.total, tracker.completed
                );
                tracker
            }
            Err(e) => {
                warn!(
                    "Failed to parse progress file {}, starting fresh: {e}",
                    path.display()
                );
                ProgressTracker::default()
            }
        }
    }

    /// Persists the tracker to disk, overwriting the previous file.
    pub fn save(&self, path: &Path) -> Result<(), EnrichmentError> {
        let content = self.serialize(path)?;
        std::fs::write(path, content).map_err(|e| EnrichmentError::ProgressSave {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Renders the tracker as the progress file's JSON body, for callers
    /// that write the file themselves.
    pub fn serialize(&self, path: &Path) -> Result<String, EnrichmentError> {
        serde_json::to_string_pretty(self).map_err(|e| EnrichmentError::ProgressSave {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    /// Deletes the on-disk tracker. Used after a run completes or when the
    /// user declines to resume. A missing file is not an error.
    pub fn clear(path: &Path) -> Result<(), EnrichmentError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EnrichmentError::ProgressSave {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// O(1) membership check against the processed set.
    pub fn is_processed(&self, address: &str) -> bool {
        self.processed_set.contains(address)
    }

    /// Records one completed address and bumps the processed count.
    pub fn record_processed(&mut self, address: &str) {
        if self.processed_set.insert(address.to_string()) {
            self.processed.push(address.to_string());
            self.processed_count = self.processed.len();
        }
        self.updated_at = Some(Utc::now());
    }

    /// Marks the run as finished.
    pub fn mark_complete(&mut self) {
        self.completed = true;
        self.updated_at = Some(Utc::now());
    }

    /// True when a prior run left unfinished work behind.
    pub fn is_resumable(&self) -> bool {
        !self.completed && self.processed_count > 0
    }

    fn rebuild_index(&mut self) {
        self.processed_set = self.processed.iter().cloned().collect();
        self.processed_count = self.processed.len();
    }
}
