use std::collections::BTreeMap;

use crate::types::EolRecord;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub per_vendor: BTreeMap<String, usize>,
    pub with_eol: usize,
    pub with_eosl: usize,
    pub total: usize,
}

impl ScrapeStats {
    pub fn from_records(records: &[EolRecord]) -> ScrapeStats {
        let mut per_vendor = BTreeMap::new();
        for record in records {
            *per_vendor.entry(record.vendor.clone()).or_insert(0) += 1;
        }

        ScrapeStats {
            per_vendor,
            with_eol: records.iter().filter(|r| r.eol_date.is_some()).count(),
            with_eosl: records.iter().filter(|r| r.eosl_date.is_some()).count(),
            total: records.len(),
        }
    }
}

impl std::fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        for (vendor, count) in &self.per_vendor {
            writeln!(f, "  {:<26}{}", format!("{}:", vendor), count)?;
        }
        writeln!(f, "  With EOL date:            {}", self.with_eol)?;
        writeln!(f, "  With EOSL date:           {}", self.with_eosl)?;
        writeln!(f, "  Total rows scraped:       {}", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(vendor: &str, model: &str, eol: bool, eosl: bool) -> EolRecord {
        EolRecord {
            vendor: vendor.to_string(),
            model: model.to_string(),
            eol_date: eol.then(Utc::now),
            eosl_date: eosl.then(Utc::now),
        }
    }

    #[test]
    fn test_stats_from_records() {
        let records = [
            record("CISCO", "A", true, false),
            record("CISCO", "B", true, true),
            record("HPE", "C", false, false),
        ];

        let stats = ScrapeStats::from_records(&records);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.with_eol, 2);
        assert_eq!(stats.with_eosl, 1);
        assert_eq!(stats.per_vendor["CISCO"], 2);
        assert_eq!(stats.per_vendor["HPE"], 1);
    }

    #[test]
    fn test_stats_display() {
        let stats = ScrapeStats::from_records(&[record("DELL", "R720", true, false)]);
        let text = stats.to_string();
        assert!(text.contains("DELL:"));
        assert!(text.contains("Total rows scraped:       1"));
    }
}
