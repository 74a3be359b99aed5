//! Registry (RDAP) enrichment.
//!
//! Queries an ordered set of registry endpoints for ownership and contact
//! metadata; the first endpoint returning a usable document wins and the
//! rest are not queried. Failures here are non-fatal per address: the caller
//! keeps whatever fields the record already has.

mod types;

pub use types::{Cidr0, RdapEntity, RdapEvent, RdapResponse};

use log::{debug, warn};

use crate::config::RegistryEndpoint;
use crate::error_handling::{EnrichmentError, ErrorType, ProcessingStats};
use crate::http::RetryingClient;
use crate::models::EnrichmentSnapshot;

/// Builds the ownership part of a snapshot from one RDAP document.
fn snapshot_from_document(registry: &str, doc: &RdapResponse) -> EnrichmentSnapshot {
    EnrichmentSnapshot {
        net_name: doc.name.clone(),
        org_name: doc.registrant_name(),
        handle: doc.handle.clone(),
        registry: Some(registry.to_string()),
        whois_server: doc.port43.clone(),
        block: doc.block_notation(),
        start_address: doc.start_address.clone(),
        end_address: doc.end_address.clone(),
        ip_version: doc.ip_version.clone(),
        object_type: doc.object_type.clone(),
        parent_handle: doc.parent_handle.clone(),
        registered_at: doc.event_date("registration"),
        last_changed_at: doc.event_date("last changed"),
        abuse_email: doc.role_email("abuse"),
        tech_email: doc.role_email("technical"),
        ..Default::default()
    }
}

/// Looks an address up against the configured registries, in order.
///
/// Endpoints are tried until one returns a parseable, usable RDAP document.
/// Per-endpoint failures (exhausted retries, error statuses, unparseable
/// bodies) are logged and the next endpoint is tried.
///
/// # Errors
///
/// [`EnrichmentError::NoRegistryResponded`] when every endpoint fails. The
/// orchestrator treats this as non-fatal for the batch.
pub async fn lookup(
    client: &RetryingClient,
    endpoints: &[RegistryEndpoint],
    address: &str,
    stats: &ProcessingStats,
) -> Result<EnrichmentSnapshot, EnrichmentError> {
    for endpoint in endpoints {
        let url = endpoint.ip_url(address);
        debug!("RDAP query {} for {}", endpoint.name, address);

        let response = match client.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                stats.increment(ErrorType::HttpTransportError);
                warn!("RDAP {} failed for {}: {e}", endpoint.name, address);
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == crate::config::HTTP_STATUS_TOO_MANY_REQUESTS {
                stats.increment(ErrorType::HttpTooManyRequests);
            } else if status.is_server_error() {
                stats.increment(ErrorType::HttpServerError);
            } else {
                stats.increment(ErrorType::HttpClientError);
            }
            debug!(
                "RDAP {} returned {} for {}, trying next registry",
                endpoint.name, status, address
            );
            continue;
        }

        match response.json::<RdapResponse>().await {
            Ok(doc) if doc.is_usable() => {
                debug!(
                    "RDAP {} answered for {} (handle {:?})",
                    endpoint.name, address, doc.handle
                );
                return Ok(snapshot_from_document(&endpoint.name, &doc));
            }
            Ok(_) => {
                debug!(
                    "RDAP {} returned an empty document for {}",
                    endpoint.name, address
                );
            }
            Err(e) => {
                stats.increment(ErrorType::RegistryParseError);
                warn!(
                    "RDAP {} returned unparseable content for {}: {e}",
                    endpoint.name, address
                );
            }
        }
    }

    Err(EnrichmentError::NoRegistryResponded {
        address: address.to_string(),
    })
}
