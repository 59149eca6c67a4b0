use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::types::{EolRecord, RawRow};

static RE_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("invalid regex: ordinal day")
});

type DateStrategy = fn(&str) -> Option<DateTime<Utc>>;

/// Tried in order; the first strategy that yields a date wins.
const DATE_STRATEGIES: &[DateStrategy] =
    &[parse_abbreviated_month, parse_full_month, parse_flexible];

const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b-%d-%Y",
    "%Y %b %d",
    "%A %b %d %Y",
    "%a %b %d %Y",
    "%Y%m%d",
];

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn parse_exact(text: &str, format: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(text, format).ok().map(midnight_utc)
}

/// `Aug 31, 2022`
fn parse_abbreviated_month(text: &str) -> Option<DateTime<Utc>> {
    parse_exact(text, "%b %d, %Y")
}

/// `August 31, 2022`
fn parse_full_month(text: &str) -> Option<DateTime<Utc>> {
    parse_exact(text, "%B %d, %Y")
}

fn parse_flexible(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let cleaned = RE_ORDINAL.replace_all(text, "$1").replace(',', " ");
    let cleaned = crate::parser::normalize_whitespace(&cleaned);

    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(&cleaned, f).ok())
        .map(|dt| dt.and_utc())
        .or_else(|| {
            FLEXIBLE_DATE_FORMATS
                .iter()
                .find_map(|f| parse_exact(&cleaned, f))
        })
}

/// Parses a listing date cell into a UTC timestamp.
///
/// Blank text and anything no strategy understands (`TBD`, `N/A`, ...) yield `None`.
/// Dates without a time or offset are taken as midnight UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_STRATEGIES.iter().find_map(|strategy| strategy(text))
}

/// Upper-cases vendors, parses dates and merges rows sharing a `(vendor, model)` key.
///
/// For each key the first non-null EOL date and the first non-null EOSL date in input
/// order are kept, independently of each other. Output is sorted by vendor, then model.
pub fn normalize(rows: &[RawRow]) -> Vec<EolRecord> {
    let mut merged: BTreeMap<(String, String), EolRecord> = BTreeMap::new();

    for row in rows {
        let vendor = row.vendor.as_str().to_uppercase();
        let eol_date = parse_date(&row.eol_text);
        let eosl_date = parse_date(&row.eosl_text);

        let record = merged
            .entry((vendor.clone(), row.model.clone()))
            .or_insert_with(|| EolRecord {
                vendor,
                model: row.model.clone(),
                eol_date: None,
                eosl_date: None,
            });

        record.eol_date = record.eol_date.or(eol_date);
        record.eosl_date = record.eosl_date.or(eosl_date);
    }

    merged.into_values().collect()
}
