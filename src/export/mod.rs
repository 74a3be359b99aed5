//! Export functionality for enriched address records.
//!
//! Flat columnar (CSV) and structured (JSON) serializations of a record set.
//! Both are pure formatting with no enrichment side effects.

mod csv;
mod json;

pub use csv::{export_csv, CSV_HEADER};
pub use json::export_json;
