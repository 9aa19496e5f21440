//! Pairwise Pearson correlation over the three numeric sensor columns.
//!
//! Produces the full 3x3 symmetric matrix over the whole dataset (never
//! per-group). The diagonal is exactly 1.0 regardless of degenerate
//! variance; off-diagonal entries with fewer than two rows or zero variance
//! in either column are undefined (`None`), never a fabricated 0/0.

use crate::types::{EquipmentRecord, NumericColumn};
use std::collections::BTreeMap;

/// Pearson correlation coefficient between two equal-length samples.
///
/// Formula: r = (n*Sxy - Sx*Sy) / sqrt((n*Sxx - Sx^2) * (n*Syy - Sy^2))
///
/// `None` when n < 2 or either column has zero variance.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|a| a * a).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// The 3x3 correlation matrix keyed by column name.
///
/// Each off-diagonal pair is computed once and mirrored, so the matrix is
/// exactly symmetric.
#[must_use]
pub fn correlation_matrix(
    records: &[EquipmentRecord],
) -> BTreeMap<String, BTreeMap<String, Option<f64>>> {
    let columns: Vec<(NumericColumn, Vec<f64>)> = NumericColumn::ALL
        .iter()
        .map(|&c| (c, records.iter().map(|r| c.value(r)).collect()))
        .collect();

    let mut matrix: BTreeMap<String, BTreeMap<String, Option<f64>>> = NumericColumn::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), BTreeMap::new()))
        .collect();

    for (i, (col_a, values_a)) in columns.iter().enumerate() {
        for (col_b, values_b) in columns.iter().skip(i) {
            let r = if col_a == col_b {
                // Diagonal is 1.0 by definition, even for constant columns
                Some(1.0)
            } else {
                pearson(values_a, values_b)
            };
            if let Some(row) = matrix.get_mut(col_a.as_str()) {
                row.insert(col_b.as_str().to_string(), r);
            }
            if let Some(row) = matrix.get_mut(col_b.as_str()) {
                row.insert(col_a.as_str().to_string(), r);
            }
        }
    }

    matrix
}
