//! Typed partial RDAP data-transfer structures.
//!
//! Only the fields the enrichment actually consumes are modeled; everything
//! else in an RDAP document is ignored at decode time. Accessors return
//! options so callers never traverse raw JSON maps.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Partial RDAP IP network response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RdapResponse {
    pub handle: Option<String>,
    /// Network name (e.g. "GOOGL-2").
    pub name: Option<String>,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
    /// "v4" or "v6".
    pub ip_version: Option<String>,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub parent_handle: Option<String>,
    /// WHOIS server, e.g. "whois.arin.net".
    pub port43: Option<String>,
    /// CIDR extension blocks ("cidr0_cidrs" in the wire format).
    #[serde(rename = "cidr0_cidrs")]
    pub cidrs: Vec<Cidr0>,
    pub events: Vec<RdapEvent>,
    pub entities: Vec<RdapEntity>,
}

/// One block from the RDAP cidr0 extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Cidr0 {
    pub v4prefix: Option<String>,
    pub v6prefix: Option<String>,
    pub length: Option<u8>,
}

/// A dated lifecycle event ("registration", "last changed", ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RdapEvent {
    pub event_action: Option<String>,
    pub event_date: Option<String>,
}

/// A contact entity, possibly nesting further entities.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RdapEntity {
    pub handle: Option<String>,
    pub roles: Vec<String>,
    /// jCard payload: `["vcard", [[name, params, type, value], ...]]`.
    pub vcard_array: Option<serde_json::Value>,
    pub entities: Vec<RdapEntity>,
}

/// Pulls the first text value for a vCard property out of a jCard payload.
fn vcard_text(vcard: &serde_json::Value, property: &str) -> Option<String> {
    let items = vcard.get(1)?.as_array()?;
    for item in items {
        let parts = item.as_array()?;
        if parts.first()?.as_str()? == property {
            if let Some(value) = parts.get(3).and_then(|v| v.as_str()) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

impl RdapEntity {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    fn email(&self) -> Option<String> {
        self.vcard_array
            .as_ref()
            .and_then(|vcard| vcard_text(vcard, "email"))
    }

    fn full_name(&self) -> Option<String> {
        self.vcard_array
            .as_ref()
            .and_then(|vcard| vcard_text(vcard, "fn"))
    }
}

impl RdapResponse {
    /// True when the document carries enough to be worth keeping.
    pub fn is_usable(&self) -> bool {
        self.handle.is_some() || self.name.is_some() || self.start_address.is_some()
    }

    /// Date of the first event with the given action.
    pub fn event_date(&self, action: &str) -> Option<DateTime<Utc>> {
        self.events
            .iter()
            .find(|event| {
                event
                    .event_action
                    .as_deref()
                    .map(|a| a.eq_ignore_ascii_case(action))
                    .unwrap_or(false)
            })
            .and_then(|event| event.event_date.as_deref())
            .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
            .map(|date| date.with_timezone(&Utc))
    }

    /// Normalized block notation: prefix/length when the cidr0 extension is
    /// present, else a textual "start - end" range.
    pub fn block_notation(&self) -> Option<String> {
        for cidr in &self.cidrs {
            let prefix = cidr.v4prefix.as_deref().or(cidr.v6prefix.as_deref());
            if let (Some(prefix), Some(length)) = (prefix, cidr.length) {
                return Some(format!("{prefix}/{length}"));
            }
        }
        match (self.start_address.as_deref(), self.end_address.as_deref()) {
            (Some(start), Some(end)) => Some(format!("{start} - {end}")),
            _ => None,
        }
    }

    /// Name of the registrant entity, when one is embedded.
    pub fn registrant_name(&self) -> Option<String> {
        self.find_entity(&|entity| entity.has_role("registrant"))
            .and_then(|entity| entity.full_name())
    }

    /// First email of the first embedded entity carrying `role`
    /// (depth-first, so top-level contacts win over nested ones).
    pub fn role_email(&self, role: &str) -> Option<String> {
        self.find_entity(&|entity| entity.has_role(role) && entity.email().is_some())
            .and_then(|entity| entity.email())
    }

    fn find_entity<'a>(&'a self, pred: &dyn Fn(&RdapEntity) -> bool) -> Option<&'a RdapEntity> {
        fn walk<'a>(
            entities: &'a [RdapEntity],
            pred: &dyn Fn(&RdapEntity) -> bool,
        ) -> Option<&'a RdapEntity> {
            for entity in entities {
                if pred(entity) {
                    return Some(entity);
                }
                if let Some(found) = walk(&entity.entities, pred) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.entities, pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> RdapResponse {
        let body = serde_json::json!({
            "handle": "NET-198-51-100-0-1",
            "name": "EXAMPLE-NET",
            "startAddress": "198.51.100.0",
            "endAddress": "198.51.100.255",
            "ipVersion": "v4",
            "type": "DIRECT ALLOCATION",
            "parentHandle": "NET-198-0-0-0-0",
            "port43": "whois.arin.net",
            "cidr0_cidrs": [ { "v4prefix": "198.51.100.0", "length": 24 } ],
            "events": [
                { "eventAction": "registration", "eventDate": "2010-04-12T00:00:00Z" },
                { "eventAction": "last changed", "eventDate": "2021-09-30T15:20:00Z" }
            ],
            "entities": [
                {
                    "handle": "EXAMPLE-ORG",
                    "roles": ["registrant"],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "Example Corp"]
                    ]],
                    "entities": [
                        {
                            "handle": "ABUSE-1",
                            "roles": ["abuse"],
                            "vcardArray": ["vcard", [
                                ["version", {}, "text", "4.0"],
                                ["email", {}, "text", "abuse@example.net"]
                            ]]
                        },
                        {
                            "handle": "TECH-1",
                            "roles": ["technical"],
                            "vcardArray": ["vcard", [
                                ["version", {}, "text", "4.0"],
                                ["email", {}, "text", "noc@example.net"]
                            ]]
                        }
                    ]
                }
            ]
        });
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_decode_partial_document() {
        let doc = sample_document();
        assert_eq!(doc.handle.as_deref(), Some("NET-198-51-100-0-1"));
        assert_eq!(doc.name.as_deref(), Some("EXAMPLE-NET"));
        assert_eq!(doc.ip_version.as_deref(), Some("v4"));
        assert_eq!(doc.object_type.as_deref(), Some("DIRECT ALLOCATION"));
        assert!(doc.is_usable());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let doc: RdapResponse = serde_json::from_value(serde_json::json!({
            "handle": "X",
            "rdapConformance": ["rdap_level_0"],
            "links": [{"rel": "self"}],
            "remarks": []
        }))
        .unwrap();
        assert_eq!(doc.handle.as_deref(), Some("X"));
    }

    #[test]
    fn test_empty_document_is_not_usable() {
        let doc: RdapResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!doc.is_usable());
    }

    #[test]
    fn test_block_notation_prefers_cidr() {
        let doc = sample_document();
        assert_eq!(doc.block_notation().as_deref(), Some("198.51.100.0/24"));
    }

    #[test]
    fn test_block_notation_falls_back_to_range() {
        let doc: RdapResponse = serde_json::from_value(serde_json::json!({
            "startAddress": "198.51.100.0",
            "endAddress": "198.51.100.255"
        }))
        .unwrap();
        assert_eq!(
            doc.block_notation().as_deref(),
            Some("198.51.100.0 - 198.51.100.255")
        );
    }

    #[test]
    fn test_event_dates() {
        let doc = sample_document();
        let registered = doc.event_date("registration").unwrap();
        assert_eq!(registered.to_rfc3339(), "2010-04-12T00:00:00+00:00");
        assert!(doc.event_date("last changed").is_some());
        assert!(doc.event_date("expiration").is_none());
    }

    #[test]
    fn test_contact_extraction_from_nested_entities() {
        let doc = sample_document();
        assert_eq!(doc.registrant_name().as_deref(), Some("Example Corp"));
        assert_eq!(
            doc.role_email("abuse").as_deref(),
            Some("abuse@example.net")
        );
        assert_eq!(
            doc.role_email("technical").as_deref(),
            Some("noc@example.net")
        );
        assert!(doc.role_email("billing").is_none());
    }
}
