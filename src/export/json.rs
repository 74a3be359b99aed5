//! JSON export.
//!
//! Serializes the record set as a JSON array, mirroring the CSV export's
//! field set through the records' serde derives.

use std::path::Path;

use crate::error_handling::EnrichmentError;
use crate::models::AddressRecord;

/// Exports records as a pretty-printed JSON array at `path`. Returns the
/// number of records written.
pub fn export_json(records: &[AddressRecord], path: &Path) -> Result<usize, EnrichmentError> {
    let wrap = |e: anyhow::Error| EnrichmentError::Export {
        path: path.to_path_buf(),
        source: e,
    };

    let content = serde_json::to_string_pretty(records).map_err(|e| wrap(e.into()))?;
    std::fs::write(path, content).map_err(|e| wrap(e.into()))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichmentSnapshot;
    use tempfile::TempDir;

    #[test]
    fn test_empty_export_is_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        export_json(&[], &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn test_export_round_trips_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let mut record = AddressRecord::new(7, "203.0.113.9");
        record.scanner_name = "censys".to_string();
        record.apply_snapshot(&EnrichmentSnapshot {
            org_name: Some("Example Corp".to_string()),
            asn: Some("AS64496".to_string()),
            ..Default::default()
        });
        let written = export_json(&[record], &path).unwrap();
        assert_eq!(written, 1);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &value.as_array().unwrap()[0];
        assert_eq!(entry["address"], "203.0.113.9");
        assert_eq!(entry["scanner_name"], "censys");
        assert_eq!(entry["org_name"], "Example Corp");
        assert_eq!(entry["asn"], "AS64496");
    }
}
