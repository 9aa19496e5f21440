//! Tabular ingestion: CSV parsing and dataset validation.
//!
//! Two stages, both all-or-nothing:
//!
//! 1. [`load_csv`] reads a CSV export into a [`RawTable`] (header + string
//!    cells, quote-aware splitting).
//! 2. [`validate`] checks the header carries every required column and
//!    coerces the numeric cells, producing typed [`EquipmentRecord`]s.
//!
//! There is no row-level skip: a single bad cell fails the whole dataset
//! before any statistics are computed, so the engine never sees a partially
//! valid snapshot.

use crate::types::{EquipmentRecord, NumericColumn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Column headers the input table must carry (a superset is fine).
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// Dataset-level validation failure. Fatal to the run; no summary is
/// produced.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input has no header row")]
    EmptyInput,

    /// Required column absent from the header (SchemaError in the external
    /// contract). Carries the full required set so callers can surface it.
    #[error("missing required columns {missing:?}; required: {REQUIRED_COLUMNS:?}")]
    MissingColumns { missing: Vec<String> },

    /// A numeric column holds a value that is not a finite real number
    /// (TypeError in the external contract).
    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    NonNumeric {
        /// 1-based data row index (header not counted)
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Unvalidated tabular data: a header row plus string cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of a header, matching on the trimmed name.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

// ============================================================================
// CSV Reading
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Check for escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Read a CSV file into a [`RawTable`]. Blank lines are skipped; the first
/// non-blank line is the header.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv_split(&line);
        match headers {
            None => headers = Some(fields),
            Some(_) => rows.push(fields),
        }
    }

    let headers = headers.ok_or(IngestError::EmptyInput)?;
    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "loaded CSV table"
    );
    Ok(RawTable { headers, rows })
}

// ============================================================================
// Schema Validation
// ============================================================================

/// Validate a raw table against the required schema and coerce numeric
/// cells, returning typed records in input order.
///
/// Either the whole dataset validates or the run aborts:
/// - any required column absent fails with [`IngestError::MissingColumns`]
/// - any numeric cell that is not a finite real number fails with
///   [`IngestError::NonNumeric`]
pub fn validate(table: &RawTable) -> Result<Vec<EquipmentRecord>, IngestError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns { missing });
    }

    // Indices are present after the check above; fall back to 0 to keep the
    // lint-clean no-panic guarantee.
    let idx = |name: &str| table.column_index(name).unwrap_or(0);
    let name_idx = idx("Equipment Name");
    let type_idx = idx("Type");
    let numeric_idx = [idx("Flowrate"), idx("Pressure"), idx("Temperature")];

    fn cell(row: &[String], i: usize) -> &str {
        row.get(i).map_or("", |s| s.as_str())
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_number, row) in table.rows.iter().enumerate() {
        let mut values = [0.0_f64; 3];
        for (slot, (column, &col_idx)) in values
            .iter_mut()
            .zip(NumericColumn::ALL.iter().zip(numeric_idx.iter()))
        {
            let raw = cell(row, col_idx).trim();
            let parsed = raw.parse::<f64>().ok().filter(|v| v.is_finite());
            match parsed {
                Some(v) => *slot = v,
                None => {
                    return Err(IngestError::NonNumeric {
                        row: row_number + 1,
                        column: column.as_str(),
                        value: raw.to_string(),
                    });
                }
            }
        }

        records.push(EquipmentRecord {
            name: cell(row, name_idx).trim().to_string(),
            equipment_type: cell(row, type_idx).trim().to_string(),
            flowrate: values[0],
            pressure: values[1],
            temperature: values[2],
        });
    }

    Ok(records)
}
