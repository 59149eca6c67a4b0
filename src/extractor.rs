//! Turns a located listing table into [`RawRow`]s.
//!
//! Columns are found by header text rather than position. A header matches a target
//! when its lowercase text contains the target as a substring (`"Model"`, `"EOL Date"`,
//! `"EOSL Date"`); the first matching header wins. Extra columns are ignored.

use crate::parser::ListingTable;
use crate::types::{RawRow, VendorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub model: usize,
    pub eol: usize,
    pub eosl: usize,
}

impl ColumnIndex {
    pub fn resolve(headers: &[String]) -> Option<Self> {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let find = |needle: &str| lowered.iter().position(|h| h.contains(needle));

        Some(Self {
            model: find("model")?,
            eol: find("eol date")?,
            eosl: find("eosl date")?,
        })
    }
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).map(|c| c.trim().to_string()).unwrap_or_default()
}

pub fn extract_rows(table: &ListingTable, vendor: &VendorId) -> Vec<RawRow> {
    let Some(columns) = ColumnIndex::resolve(&table.headers) else {
        log::debug!("Listing table for {} lacks a required column", vendor);
        return Vec::new();
    };

    table
        .rows
        .iter()
        .filter_map(|row| {
            let model = cell(row, columns.model);
            if model.is_empty() {
                return None;
            }
            Some(RawRow {
                vendor: vendor.clone(),
                model,
                eol_text: cell(row, columns.eol),
                eosl_text: cell(row, columns.eosl),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_listing_table;
    use std::fs;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn cisco() -> VendorId {
        VendorId::new("cisco").unwrap()
    }

    #[test]
    fn test_resolve_columns_in_any_order() {
        let headers = strings(&["EOSL Date", "Notes", "eol date", "Product Model"]);
        let columns = ColumnIndex::resolve(&headers).expect("all columns present");
        assert_eq!(
            columns,
            ColumnIndex {
                model: 3,
                eol: 2,
                eosl: 0
            }
        );
    }

    #[test]
    fn test_resolve_columns_missing_header() {
        let headers = strings(&["Model", "EOL Date", "Support"]);
        assert!(ColumnIndex::resolve(&headers).is_none());
    }

    #[test]
    fn test_extract_rows_from_fixture() {
        let html = fs::read_to_string("fixtures/listing/cisco_page_1.html")
            .expect("Failed to read fixture");
        let table = parse_listing_table(&html).expect("Should find the listing table");

        let rows = extract_rows(&table, &cisco());

        assert_eq!(rows.len(), 3, "Spacer row should be skipped");
        assert_eq!(
            rows[0],
            RawRow {
                vendor: cisco(),
                model: "WS-C3750X-48P-S".to_string(),
                eol_text: "Oct 30, 2016".to_string(),
                eosl_text: "Oct 31, 2021".to_string(),
            }
        );
        assert_eq!(rows[1].model, "N5K-C5548UP");
        assert_eq!(rows[1].eosl_text, "");
        assert_eq!(rows[2].eol_text, "TBD");
    }

    #[test]
    fn test_extract_rows_tolerates_short_rows() {
        let table = ListingTable {
            headers: strings(&["Model", "EOL Date", "EOSL Date"]),
            rows: vec![
                strings(&["  FAS2240  ", "Dec 31, 2019"]),
                strings(&["AFF-A200"]),
                strings(&[]),
            ],
        };

        let rows = extract_rows(&table, &cisco());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "FAS2240");
        assert_eq!(rows[0].eol_text, "Dec 31, 2019");
        assert_eq!(rows[0].eosl_text, "");
        assert_eq!(rows[1].model, "AFF-A200");
        assert_eq!(rows[1].eol_text, "");
    }

    #[test]
    fn test_extract_rows_without_required_columns() {
        let table = ListingTable {
            headers: strings(&["Name", "Date"]),
            rows: vec![strings(&["X", "Y"])],
        };
        assert!(extract_rows(&table, &cisco()).is_empty());
    }
}
