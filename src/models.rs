//! Core data model for enriched addresses.
//!
//! An [`AddressRecord`] is one extracted address (single host or CIDR block)
//! together with everything the enrichment passes learned about it. The
//! ownership/geolocation portion lives in [`EnrichmentSnapshot`] so the result
//! cache can store and restore it as a unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of the rule file an address came from.
///
/// Derived from the file's base name by case-insensitive exact match;
/// unrecognized names map to [`ScannerKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)] // Variant names are the scanner names
pub enum ScannerKind {
    Shodan,
    Censys,
    BinaryEdge,
    Shadowserver,
    Onyphe,
    Rapid7,
    InternetCensus,
    Other,
}

impl ScannerKind {
    /// Classifies a scanner name (a rule file's base name without extension).
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "shodan" => ScannerKind::Shodan,
            "censys" => ScannerKind::Censys,
            "binaryedge" => ScannerKind::BinaryEdge,
            "shadowserver" => ScannerKind::Shadowserver,
            "onyphe" => ScannerKind::Onyphe,
            "rapid7" => ScannerKind::Rapid7,
            "internet-census" => ScannerKind::InternetCensus,
            _ => ScannerKind::Other,
        }
    }

    /// Kebab-case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerKind::Shodan => "shodan",
            ScannerKind::Censys => "censys",
            ScannerKind::BinaryEdge => "binaryedge",
            ScannerKind::Shadowserver => "shadowserver",
            ScannerKind::Onyphe => "onyphe",
            ScannerKind::Rapid7 => "rapid7",
            ScannerKind::InternetCensus => "internet-census",
            ScannerKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership, network-operational, geolocation, and contact fields for one
/// address.
///
/// Every field is optional; enrichment only ever adds data. The cache stores
/// a snapshot verbatim, and [`EnrichmentSnapshot::merge`] overlays one snapshot
/// onto another without letting an empty value clobber a non-empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSnapshot {
    /// Network name from the registry object (RDAP `name`).
    pub net_name: Option<String>,
    /// Organization that holds the block (registrant entity).
    pub org_name: Option<String>,
    /// Registry handle of the network object.
    pub handle: Option<String>,
    /// Which registry answered (e.g. "arin", "ripe").
    pub registry: Option<String>,
    /// WHOIS server advertised by the registry (RDAP `port43`).
    pub whois_server: Option<String>,
    /// Normalized block notation (prefix/length, else "start - end").
    pub block: Option<String>,
    /// First address of the registered block.
    pub start_address: Option<String>,
    /// Last address of the registered block.
    pub end_address: Option<String>,
    /// Address family as reported by the registry ("v4" / "v6").
    pub ip_version: Option<String>,
    /// Registry object type (e.g. "DIRECT ALLOCATION", "ASSIGNED PA").
    pub object_type: Option<String>,
    /// Handle of the parent allocation, when the registry reports one.
    pub parent_handle: Option<String>,
    /// Registry "registration" event date.
    pub registered_at: Option<DateTime<Utc>>,
    /// Registry "last changed" event date.
    pub last_changed_at: Option<DateTime<Utc>>,
    /// Autonomous-system number, e.g. "AS15169".
    pub asn: Option<String>,
    /// Autonomous-system name, e.g. "Google LLC".
    pub asn_name: Option<String>,
    /// PTR name from geolocation or the reverse-DNS fallback.
    pub reverse_dns: Option<String>,
    /// Registrable domain derived from the reverse-DNS name.
    pub domain: Option<String>,
    /// ISO country code from geolocation.
    pub country_code: Option<String>,
    /// Country name from geolocation.
    pub country_name: Option<String>,
    /// ISP name from geolocation.
    pub isp: Option<String>,
    /// Abuse contact email from the registry's entity tree.
    pub abuse_email: Option<String>,
    /// Technical contact email from the registry's entity tree.
    pub tech_email: Option<String>,
}

/// Overlays `src` onto `dst`: a non-empty source value wins, an absent or
/// empty source value leaves the destination alone.
fn merge_text(dst: &mut Option<String>, src: &Option<String>) {
    if let Some(value) = src {
        if !value.is_empty() {
            *dst = Some(value.clone());
        }
    }
}

fn merge_time(dst: &mut Option<DateTime<Utc>>, src: &Option<DateTime<Utc>>) {
    if src.is_some() {
        *dst = *src;
    }
}

impl EnrichmentSnapshot {
    /// Merges `other` into `self`. Last writer wins per field, but a writer
    /// with nothing to say never erases an earlier value.
    pub fn merge(&mut self, other: &EnrichmentSnapshot) {
        merge_text(&mut self.net_name, &other.net_name);
        merge_text(&mut self.org_name, &other.org_name);
        merge_text(&mut self.handle, &other.handle);
        merge_text(&mut self.registry, &other.registry);
        merge_text(&mut self.whois_server, &other.whois_server);
        merge_text(&mut self.block, &other.block);
        merge_text(&mut self.start_address, &other.start_address);
        merge_text(&mut self.end_address, &other.end_address);
        merge_text(&mut self.ip_version, &other.ip_version);
        merge_text(&mut self.object_type, &other.object_type);
        merge_text(&mut self.parent_handle, &other.parent_handle);
        merge_time(&mut self.registered_at, &other.registered_at);
        merge_time(&mut self.last_changed_at, &other.last_changed_at);
        merge_text(&mut self.asn, &other.asn);
        merge_text(&mut self.asn_name, &other.asn_name);
        merge_text(&mut self.reverse_dns, &other.reverse_dns);
        merge_text(&mut self.domain, &other.domain);
        merge_text(&mut self.country_code, &other.country_code);
        merge_text(&mut self.country_name, &other.country_name);
        merge_text(&mut self.isp, &other.isp);
        merge_text(&mut self.abuse_email, &other.abuse_email);
        merge_text(&mut self.tech_email, &other.tech_email);
    }

    /// True when no enrichment pass has filled in anything yet.
    pub fn is_empty(&self) -> bool {
        *self == EnrichmentSnapshot::default()
    }
}

/// One enriched address, as produced by a bulk run or a single lookup.
///
/// `address` is set at creation and never changes. Enrichment mutates the
/// record in place; records are never deleted within a run.
#[derive(Debug, Clone, Serialize)]
pub struct AddressRecord {
    /// Position of the address in the deduplicated extraction order.
    pub id: usize,
    /// The address or CIDR block text exactly as extracted.
    pub address: String,
    /// Base name (without extension) of the originating rule file.
    pub scanner_name: String,
    /// Known-scanner classification derived from the scanner name.
    pub scanner_kind: ScannerKind,
    /// File name (with extension) of the originating rule file.
    pub source_file: String,
    /// Accumulated registry, geolocation, and DNS data.
    #[serde(flatten)]
    pub enrichment: EnrichmentSnapshot,
    /// Operator-assigned risk level, if any.
    pub risk_level: Option<String>,
    /// Operator-assigned tags, if any.
    pub tags: Option<String>,
    /// Operator notes, if any.
    pub notes: Option<String>,
    /// When the address was first observed.
    pub first_seen: Option<DateTime<Utc>>,
    /// When the address was most recently observed.
    pub last_seen: Option<DateTime<Utc>>,
    /// Stamped by the exporter at export time.
    pub exported_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last enrichment mutation time.
    pub updated_at: DateTime<Utc>,
}

impl AddressRecord {
    /// Creates a fresh record with all enrichment fields empty.
    pub fn new(id: usize, address: impl Into<String>) -> Self {
        let now = Utc::now();
        AddressRecord {
            id,
            address: address.into(),
            scanner_name: String::new(),
            scanner_kind: ScannerKind::Other,
            source_file: String::new(),
            enrichment: EnrichmentSnapshot::default(),
            risk_level: None,
            tags: None,
            notes: None,
            first_seen: Some(now),
            last_seen: Some(now),
            exported_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a snapshot (from the cache or a fresh enrichment pass) onto
    /// this record and bumps `updated_at`.
    pub fn apply_snapshot(&mut self, snapshot: &EnrichmentSnapshot) {
        self.enrichment.merge(snapshot);
        self.updated_at = Utc::now();
    }

    /// The host part used for geolocation and reverse DNS: the address itself,
    /// or the base address of a CIDR block.
    pub fn host_address(&self) -> &str {
        self.address.split('/').next().unwrap_or(&self.address)
    }
}
