//! Per-column descriptive statistics, category distribution, and the
//! quantile estimator shared by the outlier detector and health classifier.

use crate::types::{ColumnStats, EquipmentRecord, NumericColumn};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Descriptive statistics for one column's values (in input order).
///
/// Sample standard deviation uses the n-1 denominator and is reported as
/// `None` for fewer than two values; mean/min/max are `None` for an empty
/// column. Summation order is the input order, so repeated runs on the same
/// input are bit-identical.
#[must_use]
pub fn column_stats(values: &[f64]) -> ColumnStats {
    let count = values.len();
    let (mean, min, max) = if count == 0 {
        (None, None, None)
    } else {
        (Some(values.mean()), Some(values.min()), Some(values.max()))
    };
    let stddev = (count > 1).then(|| values.std_dev());
    ColumnStats {
        count,
        mean,
        min,
        max,
        stddev,
    }
}

/// Row count per distinct `Type` value. Totals across entries equal the
/// dataset row count.
#[must_use]
pub fn type_distribution(records: &[EquipmentRecord]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for record in records {
        *distribution.entry(record.equipment_type.clone()).or_insert(0) += 1;
    }
    distribution
}

/// Extract one column's values sorted ascending (for quantile queries).
#[must_use]
pub fn sorted_column(records: &[EquipmentRecord], column: NumericColumn) -> Vec<f64> {
    let mut values: Vec<f64> = records.iter().map(|r| column.value(r)).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Quantile of a sorted sample via linear interpolation between order
/// statistics: position `tau * (n-1)`, interpolating the two neighbours.
///
/// `None` for an empty sample. `tau` is clamped to [0, 1].
#[must_use]
pub fn quantile(sorted: &[f64], tau: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    let tau = tau.clamp(0.0, 1.0);
    #[allow(clippy::cast_precision_loss)]
    let position = tau * (n - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = position.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let fraction = position - position.floor();

    Some(sorted[lo] + fraction * (sorted[hi] - sorted[lo]))
}
