//! IQR-based outlier detection with configurable sensitivity.
//!
//! For each numeric column independently, quartiles are computed over the
//! entire dataset and widened by the configured multiplier:
//!
//! ```text
//! IQR   = Q3 - Q1
//! lower = Q1 - k * IQR
//! upper = Q3 + k * IQR
//! ```
//!
//! A value strictly outside `[lower, upper]` is an outlier. Bounds are
//! computed once per column per run and reused for every row (and by the
//! health classifier) - never recomputed per row. A constant column has
//! `lower == upper == Q1`, so any deviation from the constant is flagged;
//! that is intentional.

use crate::analytics::column_stats::quantile;
use crate::types::{EquipmentRecord, NumericColumn, OutlierEntry, OutlierParameter};

/// Outlier bounds for one numeric column, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBounds {
    pub column: NumericColumn,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ColumnBounds {
    /// Whether a value falls strictly outside the bounds.
    #[must_use]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Compute one column's bounds from its sorted values.
///
/// `None` for an empty dataset (no quartiles to widen).
#[must_use]
pub fn column_bounds(
    sorted: &[f64],
    column: NumericColumn,
    iqr_multiplier: f64,
) -> Option<ColumnBounds> {
    let q1 = quantile(sorted, 0.25)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(ColumnBounds {
        column,
        q1,
        q3,
        lower: q1 - iqr_multiplier * iqr,
        upper: q3 + iqr_multiplier * iqr,
    })
}

/// Scan the dataset against per-column bounds.
///
/// Columns are scanned in fixed order, rows in input order, so entries are
/// ordered by first trigger. A row triggering on several columns produces
/// exactly one entry (keyed by equipment name) accumulating every
/// triggering parameter.
#[must_use]
pub fn detect(records: &[EquipmentRecord], bounds: &[ColumnBounds]) -> Vec<OutlierEntry> {
    let mut outliers: Vec<OutlierEntry> = Vec::new();

    for b in bounds {
        for record in records {
            let value = b.column.value(record);
            if !b.is_outlier(value) {
                continue;
            }

            let parameter = OutlierParameter {
                parameter: b.column,
                value,
                lower_bound: b.lower,
                upper_bound: b.upper,
            };
            match outliers.iter_mut().find(|o| o.equipment == record.name) {
                Some(entry) => entry.parameters.push(parameter),
                None => outliers.push(OutlierEntry {
                    equipment: record.name.clone(),
                    parameters: vec![parameter],
                }),
            }
        }
    }

    outliers
}
