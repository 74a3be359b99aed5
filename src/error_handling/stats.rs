//! Processing statistics tracking.
//!
//! Thread-safe failure counters for a bulk enrichment run. Workers increment
//! counters from concurrent tasks; the orchestrator prints a summary at the
//! end of the run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe counters for failures observed during a run.
///
/// All [`ErrorType`] variants are initialized to zero on creation, so
/// increments never allocate. Share across workers with `Arc`.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl ProcessingStats {
    /// Creates a stats table with every counter at zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ProcessingStats { errors }
    }

    /// Increment a failure counter.
    pub fn increment(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                error
            );
        }
    }

    /// Current value of one counter.
    pub fn count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> usize {
        self.errors
            .values()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Logs one line per non-zero counter, plus a total.
    pub fn log_summary(&self) {
        let total = self.total();
        if total == 0 {
            log::info!("No enrichment failures recorded");
            return;
        }
        log::info!("Enrichment failures ({} total):", total);
        for error in ErrorType::iter() {
            let count = self.count(error);
            if count > 0 {
                log::info!("  {}: {}", error, count);
            }
        }
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
