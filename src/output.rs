use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::types::EolRecord;

pub const DEFAULT_PREFIX: &str = "relutech_eol_eosl";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

/// `vendor,model,eol_date,eosl_date` with a header row; missing dates are empty fields.
pub fn write_csv<W: Write>(records: &[EolRecord], writer: W) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(["vendor", "model", "eol_date", "eosl_date"])?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[EolRecord], mut writer: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Timestamped so that repeated runs never overwrite each other,
/// e.g. `relutech_eol_eosl_20261016T101500.000Z.csv`.
pub fn output_filename(prefix: &str, format: Format, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        generated_at.format("%Y%m%dT%H%M%S%.3fZ"),
        format.extension()
    )
}

pub fn write_file(
    records: &[EolRecord],
    path: &Path,
    format: Format,
) -> Result<(), OutputError> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        Format::Csv => write_csv(records, file)?,
        Format::Json => write_json(records, file)?,
    }
    log::info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
