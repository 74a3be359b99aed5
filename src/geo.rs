//! Geolocation enrichment.
//!
//! Single best-effort lookup against an ip-api style endpoint for country,
//! ISP, autonomous-system, and reverse-DNS data. Nothing here raises errors:
//! a non-success body, a non-2xx status, or a parse failure all yield an
//! empty snapshot. When geolocation produced no reverse name, the caller can
//! fall back to a system PTR lookup via [`reverse_dns`].

use hickory_resolver::TokioAsyncResolver;
use log::{debug, warn};
use serde::Deserialize;

use crate::config::GEO_FIELDS;
use crate::http::RetryingClient;
use crate::models::EnrichmentSnapshot;

/// Response body of the geolocation service (partial).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GeoResponse {
    /// "success" or "fail".
    status: String,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    isp: Option<String>,
    /// Combined AS string, e.g. "AS15169 Google LLC".
    #[serde(rename = "as")]
    autonomous_system: Option<String>,
    reverse: Option<String>,
}

/// Splits a combined autonomous-system string on the first space into number
/// and name parts.
pub(crate) fn split_autonomous_system(value: &str) -> (Option<String>, Option<String>) {
    let value = value.trim();
    if value.is_empty() {
        return (None, None);
    }
    match value.split_once(' ') {
        Some((number, name)) => (Some(number.to_string()), Some(name.trim().to_string())),
        None => (Some(value.to_string()), None),
    }
}

/// Derives a registrable domain from a reverse-DNS name: the last two labels.
pub(crate) fn derive_domain(reverse: &str) -> Option<String> {
    let trimmed = reverse.trim_end_matches('.');
    let labels: Vec<&str> = trimmed.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() >= 2 {
        Some(labels[labels.len() - 2..].join("."))
    } else {
        None
    }
}

/// Looks up geolocation data for one address. Best-effort: failures yield an
/// empty snapshot and a log line, never an error.
pub async fn lookup(client: &RetryingClient, base_url: &str, address: &str) -> EnrichmentSnapshot {
    let url = format!(
        "{}/{}?fields={}",
        base_url.trim_end_matches('/'),
        address,
        GEO_FIELDS
    );

    let response = match client.get(&url).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Geolocation request failed for {address}: {e}");
            return EnrichmentSnapshot::default();
        }
    };

    if !response.status().is_success() {
        debug!(
            "Geolocation returned {} for {address}",
            response.status()
        );
        return EnrichmentSnapshot::default();
    }

    let body: GeoResponse = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Geolocation returned unparseable content for {address}: {e}");
            return EnrichmentSnapshot::default();
        }
    };

    if body.status != "success" {
        debug!(
            "Geolocation lookup failed for {address}: {}",
            body.message.as_deref().unwrap_or("no reason given")
        );
        return EnrichmentSnapshot::default();
    }

    let (asn, asn_name) = body
        .autonomous_system
        .as_deref()
        .map(split_autonomous_system)
        .unwrap_or((None, None));
    let domain = body.reverse.as_deref().and_then(derive_domain);

    EnrichmentSnapshot {
        country_name: body.country,
        country_code: body.country_code,
        isp: body.isp,
        asn,
        asn_name,
        reverse_dns: body.reverse,
        domain,
        ..Default::default()
    }
}

/// System reverse-DNS resolution, used as a fallback when geolocation
/// produced no reverse name. Returns the first PTR name without its trailing
/// dot.
pub async fn reverse_dns(resolver: &TokioAsyncResolver, address: &str) -> Option<String> {
    let ip: std::net::IpAddr = address.parse().ok()?;
    match resolver.reverse_lookup(ip).await {
        Ok(lookup) => lookup
            .iter()
            .next()
            .map(|name| name.to_string().trim_end_matches('.').to_string()),
        Err(e) => {
            debug!("Reverse DNS lookup failed for {address}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_autonomous_system() {
        assert_eq!(
            split_autonomous_system("AS15169 Google LLC"),
            (Some("AS15169".to_string()), Some("Google LLC".to_string()))
        );
        assert_eq!(
            split_autonomous_system("AS64496"),
            (Some("AS64496".to_string()), None)
        );
        assert_eq!(split_autonomous_system(""), (None, None));
        assert_eq!(split_autonomous_system("   "), (None, None));
    }

    #[test]
    fn test_derive_domain() {
        assert_eq!(
            derive_domain("crawl-66-249-66-1.googlebot.com").as_deref(),
            Some("googlebot.com")
        );
        assert_eq!(
            derive_domain("scanner.shodan.io.").as_deref(),
            Some("shodan.io")
        );
        assert_eq!(derive_domain("localhost"), None);
        assert_eq!(derive_domain(""), None);
    }

    #[test]
    fn test_geo_response_decoding() {
        let body: GeoResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "country": "United States",
            "countryCode": "US",
            "isp": "Example ISP",
            "as": "AS64496 Example Backbone",
            "reverse": "scanner-1.example.net"
        }))
        .unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(
            body.autonomous_system.as_deref(),
            Some("AS64496 Example Backbone")
        );
    }

    #[test]
    fn test_geo_failure_status_decodes() {
        let body: GeoResponse = serde_json::from_value(serde_json::json!({
            "status": "fail",
            "message": "private range"
        }))
        .unwrap();
        assert_eq!(body.status, "fail");
        assert_eq!(body.message.as_deref(), Some("private range"));
    }
}
