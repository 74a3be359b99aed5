//! CSV export.
//!
//! Flat columnar serialization: a fixed 35-column header and one row per
//! record. Pure formatting; nothing here touches the network or mutates
//! records.

use std::path::Path;

use chrono::{DateTime, Utc};
use csv::Writer;

use crate::error_handling::EnrichmentError;
use crate::models::AddressRecord;

/// The fixed column set, in export order. Tests assert every row matches
/// this width, so the list only ever grows in lockstep with the data model.
pub const CSV_HEADER: [&str; 35] = [
    "id",
    "address",
    "scanner_name",
    "scanner_kind",
    "source_file",
    "net_name",
    "org_name",
    "handle",
    "registry",
    "whois_server",
    "block",
    "start_address",
    "end_address",
    "ip_version",
    "object_type",
    "parent_handle",
    "registered_at",
    "last_changed_at",
    "asn",
    "asn_name",
    "reverse_dns",
    "domain",
    "country_code",
    "country_name",
    "isp",
    "abuse_email",
    "tech_email",
    "risk_level",
    "tags",
    "notes",
    "first_seen",
    "last_seen",
    "exported_at",
    "created_at",
    "updated_at",
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn time(value: &Option<DateTime<Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

/// Exports records to CSV at `path`. Returns the number of data rows written.
///
/// An empty record set still produces the header row.
pub fn export_csv(records: &[AddressRecord], path: &Path) -> Result<usize, EnrichmentError> {
    let wrap = |e: anyhow::Error| EnrichmentError::Export {
        path: path.to_path_buf(),
        source: e,
    };

    let file = std::fs::File::create(path).map_err(|e| wrap(e.into()))?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(CSV_HEADER).map_err(|e| wrap(e.into()))?;

    for record in records {
        let row = [
            record.id.to_string(),
            record.address.clone(),
            record.scanner_name.clone(),
            record.scanner_kind.as_str().to_string(),
            record.source_file.clone(),
            text(&record.enrichment.net_name),
            text(&record.enrichment.org_name),
            text(&record.enrichment.handle),
            text(&record.enrichment.registry),
            text(&record.enrichment.whois_server),
            text(&record.enrichment.block),
            text(&record.enrichment.start_address),
            text(&record.enrichment.end_address),
            text(&record.enrichment.ip_version),
            text(&record.enrichment.object_type),
            text(&record.enrichment.parent_handle),
            time(&record.enrichment.registered_at),
            time(&record.enrichment.last_changed_at),
            text(&record.enrichment.asn),
            text(&record.enrichment.asn_name),
            text(&record.enrichment.reverse_dns),
            text(&record.enrichment.domain),
            text(&record.enrichment.country_code),
            text(&record.enrichment.country_name),
            text(&record.enrichment.isp),
            text(&record.enrichment.abuse_email),
            text(&record.enrichment.tech_email),
            text(&record.risk_level),
            text(&record.tags),
            text(&record.notes),
            time(&record.first_seen),
            time(&record.last_seen),
            time(&record.exported_at),
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
        ];
        debug_assert_eq!(row.len(), CSV_HEADER.len());
        writer.write_record(&row).map_err(|e| wrap(e.into()))?;
    }

    writer.flush().map_err(|e| wrap(e.into()))?;
    Ok(records.len())
}
