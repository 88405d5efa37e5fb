//! Rate tables stored as TOML.
//!
//! A rate file holds one or more `[[tables]]`. Amounts and rates should be
//! quoted strings so they parse as exact decimals:
//!
//! ```toml
//! [[tables]]
//! effective_from = "2026-01-01"
//!
//! [[tables.paye_bands]]
//! upper_bound = "800000"
//! rate = "0"
//!
//! [[tables.paye_bands]]
//! rate = "0.25"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taxlator_core::{RateSchedule, RateTable, RateTableError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RateFileError {
    #[error("Failed to read rate file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rate file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render rate table: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Rate file has no tables")]
    Empty,

    #[error("Invalid rate table: {0}")]
    RateTable(#[from] RateTableError),
}

#[derive(Debug, Deserialize, Serialize)]
struct RateFile {
    tables: Vec<RateTable>,
}

/// Parses and validates a rate schedule from TOML text.
pub fn parse_schedule(contents: &str) -> Result<RateSchedule, RateFileError> {
    let file: RateFile = toml::from_str(contents)?;
    if file.tables.is_empty() {
        return Err(RateFileError::Empty);
    }
    Ok(RateSchedule::new(file.tables)?)
}

/// Reads a rate schedule from `path`.
pub fn load_schedule(path: &Path) -> Result<RateSchedule, RateFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RateFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schedule = parse_schedule(&contents)?;
    debug!(path = %path.display(), tables = schedule.tables().len(), "loaded rate file");
    Ok(schedule)
}

/// Renders one table in the rate-file format.
pub fn render_table(table: &RateTable) -> Result<String, RateFileError> {
    let file = RateFile {
        tables: vec![table.clone()],
    };
    Ok(toml::to_string_pretty(&file)?)
}
