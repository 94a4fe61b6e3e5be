//! Result formatting
//!
//! Records are rendered into a fixed column order, either as CSV with every
//! field quoted and a header row, or as a JSON array of objects keyed by the
//! same column names. Formatting is pure: the same records always produce the
//! same bytes.

mod rows;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use rows::{GROUP_COLUMNS, GroupPostRow, MARKETPLACE_COLUMNS, MarketplaceListingRow};

use crate::jobs::JobResults;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unknown export format '{0}', expected 'csv' or 'json'")]
    UnknownFormat(String),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render results in the requested format
pub fn format_results(results: &JobResults, format: ExportFormat) -> Result<String, ExportError> {
    match results {
        JobResults::Groups(records) => {
            let rows: Vec<GroupPostRow> = records.iter().map(GroupPostRow::from).collect();
            render(&rows, GROUP_COLUMNS, format)
        }
        JobResults::Marketplace(records) => {
            let rows: Vec<MarketplaceListingRow> =
                records.iter().map(MarketplaceListingRow::from).collect();
            render(&rows, MARKETPLACE_COLUMNS, format)
        }
    }
}

fn render<R: Serialize>(
    rows: &[R],
    columns: &[&str],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(rows, columns),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
    }
}

fn to_csv<R: Serialize>(rows: &[R], columns: &[&str]) -> Result<String, ExportError> {
    // Header written by hand so an empty result set still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8(bytes)?)
}
