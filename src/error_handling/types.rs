//! Error type definitions.
//!
//! This module defines the error taxonomy for extraction and enrichment, plus
//! the counter categories used by [`super::ProcessingStats`].

use log::SetLoggerError;
use std::path::PathBuf;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Errors raised by extraction and enrichment.
///
/// Propagation policy: per-address failures (`RetriesExhausted`,
/// `NoRegistryResponded`) never abort a batch; only `DirectoryNotFound`,
/// cache/progress save failures, and export failures surface as batch-level
/// errors.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// The rule-file root directory does not exist.
    #[error("rules directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// All retry attempts for one outbound request were spent.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Every configured registry endpoint failed or returned unparseable
    /// content for an address. Non-fatal: the address keeps whatever fields
    /// it already has.
    #[error("no registry responded for {address}")]
    NoRegistryResponded { address: String },

    /// Writing the result cache to disk failed.
    #[error("failed to save result cache to {path}: {source}")]
    CacheSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the progress tracker to disk failed.
    #[error("failed to save progress tracker to {path}: {source}")]
    ProgressSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV or JSON export failed.
    #[error("export to {path} failed: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    #[allow(dead_code)] // Reserved for resolver configs that can actually fail
    DnsResolverError(String),
}

/// Counter categories for failures observed during a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Transport-level failure (connect, timeout, protocol).
    HttpTransportError,
    /// HTTP 429 after exhausting Retry-After handling.
    HttpTooManyRequests,
    /// HTTP 5xx after exhausting retries.
    HttpServerError,
    /// Terminal HTTP 4xx (not retried).
    HttpClientError,
    /// Every registry endpoint failed for an address.
    NoRegistryResponded,
    /// Registry answered but the body was not a usable RDAP document.
    RegistryParseError,
    /// Geolocation returned a non-success status or unparseable body.
    GeolocationEmpty,
    /// Reverse-DNS fallback lookup failed.
    ReverseDnsError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Human-readable label used in the end-of-run summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpTransportError => "HTTP transport error",
            ErrorType::HttpTooManyRequests => "Too many requests (429)",
            ErrorType::HttpServerError => "HTTP server error (5xx)",
            ErrorType::HttpClientError => "HTTP client error (4xx)",
            ErrorType::NoRegistryResponded => "No registry responded",
            ErrorType::RegistryParseError => "Registry parse error",
            ErrorType::GeolocationEmpty => "Geolocation empty",
            ErrorType::ReverseDnsError => "Reverse DNS error",
        }
    }
}
