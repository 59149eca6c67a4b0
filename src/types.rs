use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
#[error("Invalid vendor '{0}'. Expected a single non-empty URL path segment")]
pub struct VendorIdError(String);

/// Lowercase token naming one vendor listing, e.g. `cisco` in `/eol-eosl/cisco`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VendorId(String);

impl VendorId {
    pub fn new(raw: &str) -> Result<Self, VendorIdError> {
        let token = raw.trim().to_lowercase();
        if token.is_empty()
            || token == "."
            || token == ".."
            || token
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | ':' | '%' | '\\'))
        {
            return Err(VendorIdError(raw.to_string()));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VendorId {
    type Err = VendorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VendorId {
    type Error = VendorIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<VendorId> for String {
    fn from(value: VendorId) -> Self {
        value.0
    }
}

impl Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One listing table row as scraped, before any date parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub vendor: VendorId,
    pub model: String,
    pub eol_text: String,
    pub eosl_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EolRecord {
    pub vendor: String,
    pub model: String,
    #[serde(serialize_with = "serialize_utc")]
    pub eol_date: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_utc")]
    pub eosl_date: Option<DateTime<Utc>>,
}

/// ISO 8601 with an explicit `+00:00` offset, e.g. `2022-08-31T00:00:00+00:00`.
/// Sub-second precision is kept when present.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn serialize_utc<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&format_utc(dt)),
        None => serializer.serialize_none(),
    }
}

impl Display for EolRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let date = |d: &Option<DateTime<Utc>>| {
            d.map(|d| d.date_naive().to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(
            f,
            "[{}] {}: EOL {} / EOSL {}",
            self.vendor,
            self.model,
            date(&self.eol_date),
            date(&self.eosl_date)
        )
    }
}
