//! Configuration constants.
//!
//! Defaults and fixed operational parameters: retry schedule, cache TTL,
//! timeouts, and the rule-file conventions the parser expects.

// Rule-file conventions
/// Extension (without dot) of the rule files the parser processes.
pub const RULE_FILE_EXTENSION: &str = "nft";
/// Lines starting with this prefix are comments and never contribute addresses.
pub const COMMENT_PREFIX: char = '#';

// Cache and progress persistence
/// Default result-cache time-to-live in hours (7 days; a non-positive
/// configured TTL falls back to this).
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 168;
/// The progress tracker is persisted after this many completions, and once
/// more at the end of the run.
pub const PROGRESS_PERSIST_INTERVAL: usize = 10;

// Worker pool defaults
pub const DEFAULT_PARALLELISM: usize = 4;
/// Default minimum interval between outbound requests, in seconds.
pub const DEFAULT_THROTTLE_SECONDS: f64 = 1.0;

// Network operation timeouts
/// Per-attempt HTTP timeout in seconds (connect + response).
pub const HTTP_TIMEOUT_SECS: u64 = 10;
/// DNS query timeout in seconds for the reverse-lookup fallback.
pub const DNS_TIMEOUT_SECS: u64 = 3;

// Retry strategy
/// Initial delay in milliseconds before the first retry.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the retry delay doubles on each attempt.
pub const RETRY_FACTOR: u32 = 2;
/// Cap on the backoff delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 10;
/// Maximum additional attempts after the initial one (4 attempts total).
pub const RETRY_MAX_RETRIES: usize = 3;
/// Up to this fraction of the base delay is added as random jitter.
pub const RETRY_JITTER_FRACTION: f64 = 0.25;

// Geolocation service
/// Base URL of the geolocation endpoint; `/{address}` is appended.
pub const GEO_BASE_URL: &str = "http://ip-api.com/json";
/// Fields requested from the geolocation service.
pub const GEO_FIELDS: &str = "status,message,country,countryCode,isp,as,reverse";

// Progress logging
/// Interval in seconds between progress log lines during a bulk run.
pub const LOGGING_INTERVAL_SECS: u64 = 5;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
