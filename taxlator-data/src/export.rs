//! Writes calculation history out as CSV or JSON.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::SecondsFormat;
use taxlator_core::HistoryRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported export format '{0}'; expected csv or json")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

/// Writes `records` in `format`.
///
/// CSV rows are `kind,created_at,input,result` with input and result kept as
/// JSON text. JSON output is a pretty-printed array of records.
pub fn write_history<W: Write>(
    writer: W,
    records: &[HistoryRecord],
    format: ExportFormat,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(writer, records),
        ExportFormat::Json => write_json(writer, records),
    }
}

fn write_csv<W: Write>(
    writer: W,
    records: &[HistoryRecord],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["kind", "created_at", "input", "result"])?;

    for record in records {
        csv_writer.write_record([
            record.kind.as_str().to_string(),
            record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.input.to_string(),
            record.result.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(
    mut writer: W,
    records: &[HistoryRecord],
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}
