//! Configuration types and CLI options.
//!
//! [`EnrichmentConfig`] is the CLI-free configuration the library consumes;
//! it is constructed programmatically by tests and embedders, or from the
//! clap-parsed [`Opt`] by the binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::config::constants::{
    DEFAULT_CACHE_TTL_HOURS, DEFAULT_PARALLELISM, DEFAULT_THROTTLE_SECONDS, HTTP_TIMEOUT_SECS,
};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// One of the regional registries answering RDAP queries for address blocks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// American Registry for Internet Numbers
    Arin,
    /// RIPE Network Coordination Centre
    Ripe,
    /// Asia-Pacific Network Information Centre
    Apnic,
    /// Latin America and Caribbean Network Information Centre
    Lacnic,
    /// African Network Information Centre
    Afrinic,
}

impl Registry {
    /// Lowercase registry identifier used in logs, CLI args, and records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Arin => "arin",
            Registry::Ripe => "ripe",
            Registry::Apnic => "apnic",
            Registry::Lacnic => "lacnic",
            Registry::Afrinic => "afrinic",
        }
    }

    /// Public RDAP base URL; the IP query path is `{base}/ip/{address}`.
    pub fn base_url(&self) -> &'static str {
        match self {
            Registry::Arin => "https://rdap.arin.net/registry",
            Registry::Ripe => "https://rdap.db.ripe.net",
            Registry::Apnic => "https://rdap.apnic.net",
            Registry::Lacnic => "https://rdap.lacnic.net/rdap",
            Registry::Afrinic => "https://rdap.afrinic.net/rdap",
        }
    }

    /// All five registries, in default query order.
    pub fn all() -> Vec<Registry> {
        Registry::iter().collect()
    }
}

impl std::fmt::Display for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved registry endpoint: the registry's name and the RDAP base URL
/// queries are issued against.
#[derive(Debug, Clone)]
pub struct RegistryEndpoint {
    /// Lowercase registry identifier (e.g. "arin").
    pub name: String,
    /// RDAP base URL queries are issued against.
    pub base_url: String,
}

impl RegistryEndpoint {
    /// Full RDAP IP query URL for one address.
    pub fn ip_url(&self, address: &str) -> String {
        format!("{}/ip/{}", self.base_url.trim_end_matches('/'), address)
    }
}

/// Library configuration (no CLI dependencies).
///
/// Treated as read-only input by the enrichment core. The base-URL overrides
/// exist so tests and embedders can point lookups at their own servers.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Root directory walked for rule files.
    pub rules_dir: PathBuf,

    /// Ordered subset of registries queried for ownership data.
    pub registries: Vec<Registry>,

    /// Minimum interval between outbound requests in seconds (0 disables
    /// rate limiting).
    pub throttle_seconds: f64,

    /// Number of concurrent enrichment workers (>= 1).
    pub parallelism: usize,

    /// Result-cache time-to-live in hours; non-positive falls back to the
    /// 168-hour default.
    pub cache_ttl_hours: i64,

    /// On-disk result cache location.
    pub cache_path: PathBuf,

    /// On-disk progress tracker location.
    pub progress_path: PathBuf,

    /// Per-attempt HTTP timeout in seconds.
    pub timeout_seconds: u64,

    /// Override the RDAP base URL for every configured registry (tests).
    pub rdap_base_url: Option<String>,

    /// Override the geolocation endpoint base URL (tests).
    pub geo_base_url: Option<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("./rules"),
            registries: Registry::all(),
            throttle_seconds: DEFAULT_THROTTLE_SECONDS,
            parallelism: DEFAULT_PARALLELISM,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            cache_path: PathBuf::from("./address_cache.json"),
            progress_path: PathBuf::from("./enrichment_progress.json"),
            timeout_seconds: HTTP_TIMEOUT_SECS,
            rdap_base_url: None,
            geo_base_url: None,
        }
    }
}

impl EnrichmentConfig {
    /// TTL with the non-positive fallback applied.
    pub fn effective_cache_ttl_hours(&self) -> i64 {
        if self.cache_ttl_hours <= 0 {
            DEFAULT_CACHE_TTL_HOURS
        } else {
            self.cache_ttl_hours
        }
    }

    /// Parallelism clamped to at least one worker.
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.max(1)
    }

    /// The registry endpoints to query, in order, with any base-URL override
    /// applied.
    pub fn registry_endpoints(&self) -> Vec<RegistryEndpoint> {
        self.registries
            .iter()
            .map(|registry| RegistryEndpoint {
                name: registry.as_str().to_string(),
                base_url: self
                    .rdap_base_url
                    .clone()
                    .unwrap_or_else(|| registry.base_url().to_string()),
            })
            .collect()
    }
}

/// Command-line options (binary only).
#[derive(Debug, Parser)]
#[command(
    name = "address_intel",
    about = "Extracts addresses from firewall rule files and enriches them with RDAP ownership and geolocation metadata"
)]
pub struct Opt {
    /// Root directory containing rule files
    #[arg(default_value = "./rules")]
    pub rules_dir: PathBuf,

    /// Directory for exported result files
    #[arg(long, default_value = "./results")]
    pub results_dir: PathBuf,

    /// Registries to query, in order
    #[arg(long, value_enum, value_delimiter = ',')]
    pub registries: Vec<Registry>,

    /// Minimum seconds between outbound requests (0 disables rate limiting)
    #[arg(long, default_value_t = DEFAULT_THROTTLE_SECONDS)]
    pub throttle: f64,

    /// Number of concurrent enrichment workers
    #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    /// Result-cache time-to-live in hours (<= 0 uses the 168h default)
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_HOURS)]
    pub cache_ttl_hours: i64,

    /// Result cache file
    #[arg(long, default_value = "./address_cache.json")]
    pub cache_file: PathBuf,

    /// Progress tracker file
    #[arg(long, default_value = "./enrichment_progress.json")]
    pub progress_file: PathBuf,

    /// Export results as CSV to this path after the run
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export results as JSON to this path after the run
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Discard a half-finished previous run instead of resuming it
    #[arg(long)]
    pub no_resume: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Opt {
    /// Builds the library configuration from the parsed CLI options.
    pub fn to_config(&self) -> EnrichmentConfig {
        EnrichmentConfig {
            rules_dir: self.rules_dir.clone(),
            registries: if self.registries.is_empty() {
                Registry::all()
            } else {
                self.registries.clone()
            },
            throttle_seconds: self.throttle.max(0.0),
            parallelism: self.parallelism,
            cache_ttl_hours: self.cache_ttl_hours,
            cache_path: self.cache_file.clone(),
            progress_path: self.progress_file.clone(),
            ..Default::default()
        }
    }
}
