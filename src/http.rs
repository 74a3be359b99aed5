//! Retrying HTTP client.
//!
//! Wraps outbound GETs with exponential backoff, jitter, and protocol-aware
//! retry rules. The backoff schedule is a pure function of the attempt number
//! so it can be tested without a transport; the attempt loop lives in
//! [`RetryingClient::get`].
//!
//! Retry rules:
//! - transport failures and HTTP 5xx retry on the exponential schedule
//! - HTTP 429 honors a positive `Retry-After` (seconds or HTTP date),
//!   falling back to the exponential schedule otherwise
//! - any other 4xx is terminal and returned immediately

use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::debug;
use rand::Rng;
use reqwest::{Client, Response};

use crate::config::{
    HTTP_STATUS_TOO_MANY_REQUESTS, RETRY_FACTOR, RETRY_INITIAL_DELAY_MS, RETRY_JITTER_FRACTION,
    RETRY_MAX_DELAY_SECS, RETRY_MAX_RETRIES,
};
use crate::error_handling::EnrichmentError;

/// Backoff schedule: 500 ms before the first retry, doubling each attempt,
/// capped at 10 s. `attempt` is zero-based (0 = delay before the first retry).
pub fn backoff_delay(attempt: usize) -> Duration {
    let factor = u64::from(RETRY_FACTOR).saturating_pow(attempt.min(u32::MAX as usize) as u32);
    let millis = RETRY_INITIAL_DELAY_MS.saturating_mul(factor);
    Duration::from_millis(millis).min(Duration::from_secs(RETRY_MAX_DELAY_SECS))
}

/// Adds up to 25% random jitter on top of a base delay.
fn with_jitter(delay: Duration) -> Duration {
    let jitter = rand::rng().random_range(0.0..=RETRY_JITTER_FRACTION);
    delay.mul_f64(1.0 + jitter)
}

/// Parses a `Retry-After` header value: whole seconds, or an HTTP date.
/// Returns `None` for unparseable values and dates in the past.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return (date.with_timezone(&Utc) - Utc::now()).to_std().ok();
    }
    None
}

/// HTTP client with retry semantics shared by all enrichment lookups.
#[derive(Clone)]
pub struct RetryingClient {
    client: Client,
}

impl RetryingClient {
    /// Wraps an already-configured `reqwest` client.
    pub fn new(client: Client) -> Self {
        RetryingClient { client }
    }

    /// Performs a GET, retrying transient failures up to three additional
    /// attempts. Returns the response for any terminal outcome, including
    /// non-429 4xx statuses; the caller decides what a usable status is.
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::RetriesExhausted`] wrapping the last observed error
    /// once all attempts are spent.
    pub async fn get(&self, url: &str) -> Result<Response, EnrichmentError> {
        let mut attempt = 0usize;
        let mut last_error: Option<anyhow::Error> = None;

        loop {
            let mut retry_after: Option<Duration> = None;
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() {
                        last_error = Some(anyhow!("server error {status} from {url}"));
                    } else if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
                        retry_after = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(parse_retry_after)
                            .filter(|d| *d > Duration::ZERO);
                        last_error = Some(anyhow!("rate limited (429) by {url}"));
                    } else {
                        // Success, or a terminal 4xx the caller must inspect
                        return Ok(response);
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e));
                }
            }

            attempt += 1;
            if attempt > RETRY_MAX_RETRIES {
                return Err(EnrichmentError::RetriesExhausted {
                    attempts: attempt,
                    source: last_error.take().unwrap_or_else(|| anyhow!("request failed")),
                });
            }

            let delay = retry_after.unwrap_or_else(|| with_jitter(backoff_delay(attempt - 1)));
            debug!(
                "Retrying {url} in {:.2}s (attempt {} of {})",
                delay.as_secs_f64(),
                attempt + 1,
                RETRY_MAX_RETRIES + 1
            );
            tokio::time::sleep(delay).await;
        }
    }
}
