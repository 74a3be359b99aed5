//! Error handling and processing statistics.
//!
//! This module provides:
//! - The enrichment error taxonomy ([`EnrichmentError`])
//! - Initialization error types
//! - Thread-safe failure counters for bulk runs ([`ProcessingStats`])
//!
//! Per-address failures are counted, logged, and skipped; only directory,
//! save, and export failures propagate to the caller.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{EnrichmentError, ErrorType, InitializationError};
