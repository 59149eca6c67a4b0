use std::collections::BTreeSet;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extractor::ColumnIndex;
use crate::types::VendorId;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed sitemap XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Sitemap has no <url> entries")]
    EmptySitemap,
}

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));
static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: tr"));

/// Header and body cell texts of the one listing table on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ListingTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `td`/`th` children of a row, in document order.
fn row_cells(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .collect()
}

fn is_header_cell(cell: &ElementRef) -> bool {
    cell.value().name() == "th"
}

/// A lone spanning cell such as `<td colspan="4">No records found</td>`.
fn is_placeholder_row(cells: &[ElementRef]) -> bool {
    matches!(cells, [cell] if !is_header_cell(cell) && cell.value().attr("colspan").is_some())
}

fn cell_texts(cells: Vec<ElementRef>) -> Vec<String> {
    cells
        .into_iter()
        .map(|cell| normalize_whitespace(&elem_text(cell)))
        .collect()
}

/// Finds the first table whose header row names Model, EOL Date and EOSL Date.
///
/// The header row is the first `tr` made only of `th` cells that names all three
/// columns, so title rows above it are skipped. Every later row holding at least one
/// `td` is a body row, except a lone `colspan` placeholder cell.
pub fn parse_listing_table(html: &str) -> Option<ListingTable> {
    let document = Html::parse_document(html);

    document.select(&TABLE_SEL).find_map(|table| {
        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for row in table.select(&ROW_SEL) {
            let cells = row_cells(row);
            if cells.is_empty() {
                continue;
            }
            let all_th = cells.iter().all(is_header_cell);
            if headers.is_none() && all_th {
                let texts = cell_texts(cells);
                if ColumnIndex::resolve(&texts).is_some() {
                    headers = Some(texts);
                }
            } else if headers.is_some() && !all_th && !is_placeholder_row(&cells) {
                rows.push(cell_texts(cells));
            }
        }

        headers.map(|headers| ListingTable { headers, rows })
    })
}

/// Collects vendor ids from the `<loc>` entries of a sitemap that live under `base_path`.
///
/// `https://relutech.com/eol-eosl/cisco/some-model` with base path `/eol-eosl/` yields
/// `cisco`. The base path page itself and entries outside it are ignored.
pub fn parse_sitemap_vendors(
    xml: &str,
    base_path: &str,
) -> Result<BTreeSet<VendorId>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut vendors = BTreeSet::new();
    let mut in_loc = false;
    let mut url_entries = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"url" => url_entries += 1,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"loc" => in_loc = false,
            Event::Text(text) if in_loc => {
                let loc = text.unescape()?;
                if let Some(vendor) = vendor_from_loc(loc.trim(), base_path) {
                    vendors.insert(vendor);
                }
            }
            Event::CData(data) if in_loc => {
                let loc = String::from_utf8_lossy(&data);
                if let Some(vendor) = vendor_from_loc(loc.trim(), base_path) {
                    vendors.insert(vendor);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if url_entries == 0 {
        return Err(ParseError::EmptySitemap);
    }

    Ok(vendors)
}

fn vendor_from_loc(loc: &str, base_path: &str) -> Option<VendorId> {
    let url = Url::parse(loc).ok()?;
    let tail = url.path().strip_prefix(base_path)?.trim_start_matches('/');
    let segment = tail.split('/').next()?;
    VendorId::new(segment).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_listing_table_from_fixture() {
        let html = fs::read_to_string("fixtures/listing/cisco_page_1.html")
            .expect("Failed to read fixture");

        let table = parse_listing_table(&html).expect("Should find the listing table");
        assert_eq!(table.headers, ["Model", "EOL Date", "EOSL Date", "Action"]);
        assert_eq!(table.rows.len(), 3, "Spacer row is not a body row");
        assert_eq!(table.rows[0][0], "WS-C3750X-48P-S");
        assert_eq!(table.rows[0][1], "Oct 30, 2016");
    }

    #[test]
    fn test_parse_listing_table_skips_unrelated_tables() {
        let html = r#"
            <table><tr><th>Plan</th><th>Price</th></tr><tr><td>Gold</td><td>$9</td></tr></table>
            <table>
              <thead><tr><th>eol date</th><th>MODEL NAME</th><th>Eosl Date (est.)</th></tr></thead>
              <tbody><tr><td>Aug 31, 2022</td><td>PowerEdge R720</td><td></td></tr></tbody>
            </table>"#;

        let table = parse_listing_table(html).expect("Should find the second table");
        assert_eq!(table.headers[1], "MODEL NAME");
        assert_eq!(table.rows, [["Aug 31, 2022", "PowerEdge R720", ""]]);
    }

    #[test]
    fn test_parse_listing_table_skips_title_row_above_header() {
        let html = r#"
            <table>
              <tr><th colspan="4">Cisco EOL Listing</th></tr>
              <tr><th>Model</th><th>EOL Date</th><th>EOSL Date</th><th>Action</th></tr>
              <tr><td>N5K-C5548UP</td><td>Aug 31, 2022</td><td></td><td>Quote</td></tr>
            </table>"#;

        let table = parse_listing_table(html).expect("Should find the listing table");
        assert_eq!(table.headers, ["Model", "EOL Date", "EOSL Date", "Action"]);
        assert_eq!(table.rows, [["N5K-C5548UP", "Aug 31, 2022", "", "Quote"]]);
    }

    #[test]
    fn test_parse_listing_table_ignores_placeholder_row() {
        let html = r#"
            <table>
              <tr><th>Model</th><th>EOL Date</th><th>EOSL Date</th><th>Action</th></tr>
              <tr><td colspan="4">No records found</td></tr>
            </table>"#;

        let table = parse_listing_table(html).expect("Header row is still present");
        assert!(table.is_empty(), "placeholder counted as a row: {:?}", table.rows);
    }

    #[test]
    fn test_parse_listing_table_absent() {
        let html = "<html><body><p>No results found.</p></body></html>";
        assert!(parse_listing_table(html).is_none());
    }

    #[test]
    fn test_parse_listing_table_with_empty_body() {
        let html = fs::read_to_string("fixtures/listing/empty_page.html")
            .expect("Failed to read fixture");

        let table = parse_listing_table(&html).expect("Header row is still present");
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_sitemap_vendors_from_fixture() {
        let xml = fs::read_to_string("fixtures/sitemap.xml").expect("Failed to read fixture");

        let vendors = parse_sitemap_vendors(&xml, "/eol-eosl/").expect("Should parse sitemap");
        let names: Vec<&str> = vendors.iter().map(VendorId::as_str).collect();
        assert_eq!(names, ["cisco", "dell", "emc-ecomm", "hpe"]);
    }

    #[test]
    fn test_parse_sitemap_vendors_rejects_malformed_xml() {
        let xml = "<urlset><url><loc>https://relutech.com/eol-eosl/cisco</loc></urlset>";
        assert!(parse_sitemap_vendors(xml, "/eol-eosl/").is_err());
    }

    #[test]
    fn test_parse_sitemap_vendors_rejects_non_sitemap() {
        let result = parse_sitemap_vendors("502 Bad Gateway", "/eol-eosl/");
        assert!(matches!(result, Err(ParseError::EmptySitemap)));
    }

    #[test]
    fn test_vendor_from_loc() {
        let base = "/eol-eosl/";
        assert_eq!(
            vendor_from_loc("https://relutech.com/eol-eosl/Juniper/ex4200", base),
            Some(VendorId::new("juniper").unwrap())
        );
        assert_eq!(vendor_from_loc("https://relutech.com/eol-eosl/", base), None);
        assert_eq!(vendor_from_loc("https://relutech.com/blog/cisco", base), None);
        assert_eq!(vendor_from_loc("not a url", base), None);
    }
}
