//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (retry schedule, TTLs, timeouts)
//! - The library configuration type and registry endpoints
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{EnrichmentConfig, LogFormat, LogLevel, Opt, Registry, RegistryEndpoint};
