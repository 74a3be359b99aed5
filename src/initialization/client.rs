//! HTTP client initialization.

use std::time::Duration;

use crate::error_handling::InitializationError;
use crate::http::RetryingClient;

/// Creates a retrying HTTP client with the given request timeout.
///
/// The underlying `reqwest::Client` pools connections, so a single client is
/// shared across all enrichment workers.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the client cannot be built.
pub fn init_client(timeout_seconds: u64) -> Result<RetryingClient, InitializationError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(InitializationError::from)?;

    Ok(RetryingClient::new(client))
}
