//! Per-row health classification.
//!
//! Layered policy, first match wins:
//!
//! 1. **critical** - the row's equipment name was flagged by the outlier
//!    detector (any parameter). Always dominates, even when the row's
//!    values sit below the warning percentile.
//! 2. **warning** - at least one of the row's values strictly exceeds the
//!    dataset-wide value at the configured warning percentile for that
//!    column.
//! 3. **normal** - otherwise.
//!
//! The warning percentile is computed over the whole dataset, outlier rows
//! included, independent of grouping.

use crate::analytics::column_stats::quantile;
use crate::types::{AnnotatedRow, EquipmentRecord, HealthStatus, NumericColumn, OutlierEntry};
use std::collections::HashSet;

/// Dataset-wide warning thresholds, one per numeric column in scan order.
///
/// `None` for an empty dataset (no quantile exists; nothing can warn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningThresholds {
    thresholds: [Option<f64>; 3],
}

impl WarningThresholds {
    /// Compute the per-column warning thresholds once for the run.
    ///
    /// `sorted_columns` are the three columns' sorted values in
    /// [`NumericColumn::ALL`] order.
    #[must_use]
    pub fn compute(sorted_columns: &[Vec<f64>; 3], warning_percentile: f64) -> Self {
        let mut thresholds = [None; 3];
        for (slot, sorted) in thresholds.iter_mut().zip(sorted_columns.iter()) {
            *slot = quantile(sorted, warning_percentile);
        }
        Self { thresholds }
    }

    /// Whether any of the row's values strictly exceeds its column
    /// threshold.
    #[must_use]
    pub fn exceeded_by(&self, record: &EquipmentRecord) -> bool {
        NumericColumn::ALL
            .iter()
            .zip(self.thresholds.iter())
            .any(|(&column, threshold)| {
                threshold.is_some_and(|t| column.value(record) > t)
            })
    }
}

/// Classify every row, producing annotated rows in input order.
#[must_use]
pub fn classify(
    records: &[EquipmentRecord],
    outliers: &[OutlierEntry],
    warning: &WarningThresholds,
) -> Vec<AnnotatedRow> {
    let outlier_names: HashSet<&str> =
        outliers.iter().map(|o| o.equipment.as_str()).collect();

    records
        .iter()
        .map(|record| {
            let health_status = if outlier_names.contains(record.name.as_str()) {
                HealthStatus::Critical
            } else if warning.exceeded_by(record) {
                HealthStatus::Warning
            } else {
                HealthStatus::Normal
            };
            AnnotatedRow {
                record: record.clone(),
                health_status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::column_stats::sorted_column;
    use crate::types::OutlierParameter;

    fn record(name: &str, flow: f64, pressure: f64, temp: f64) -> EquipmentRecord {
        EquipmentRecord {
            name: name.to_string(),
            equipment_type: "Pump".to_string(),
            flowrate: flow,
            pressure,
            temperature: temp,
        }
    }

    fn thresholds_for(records: &[EquipmentRecord], percentile: f64) -> WarningThresholds {
        let sorted = [
            sorted_column(records, NumericColumn::Flowrate),
            sorted_column(records, NumericColumn::Pressure),
            sorted_column(records, NumericColumn::Temperature),
        ];
        WarningThresholds::compute(&sorted, percentile)
    }

    fn outlier_for(name: &str) -> OutlierEntry {
        OutlierEntry {
            equipment: name.to_string(),
            parameters: vec![OutlierParameter {
                parameter: NumericColumn::Flowrate,
                value: 999.0,
                lower_bound: 0.0,
                upper_bound: 100.0,
            }],
        }
    }

    #[test]
    fn test_outlier_always_critical() {
        // A's values are the lowest in every column, far below any warning
        // percentile - outlier membership must still dominate.
        let records = vec![
            record("A", 1.0, 10.0, 5.0),
            record("B", 10.0, 100.0, 50.0),
            record("C", 12.0, 102.0, 52.0),
        ];
        let warning = thresholds_for(&records, 0.75);
        let rows = classify(&records, &[outlier_for("A")], &warning);
        assert_eq!(rows[0].health_status, HealthStatus::Critical);
    }

    #[test]
    fn test_warning_above_percentile() {
        let records = vec![
            record("A", 10.0, 100.0, 50.0),
            record("B", 11.0, 101.0, 51.0),
            record("C", 12.0, 102.0, 52.0),
            record("D", 13.0, 103.0, 53.0),
        ];
        let warning = thresholds_for(&records, 0.75);
        let rows = classify(&records, &[], &warning);
        // 75th percentile of each column is the 12.25/102.25/52.25 point;
        // only D strictly exceeds it.
        assert_eq!(rows[0].health_status, HealthStatus::Normal);
        assert_eq!(rows[1].health_status, HealthStatus::Normal);
        assert_eq!(rows[2].health_status, HealthStatus::Normal);
        assert_eq!(rows[3].health_status, HealthStatus::Warning);
    }

    #[test]
    fn test_single_column_exceedance_is_enough() {
        let records = vec![
            record("A", 10.0, 100.0, 50.0),
            record("B", 10.0, 100.0, 50.0),
            record("C", 10.0, 100.0, 50.0),
            record("D", 10.0, 100.0, 58.0),
        ];
        let warning = thresholds_for(&records, 0.75);
        let rows = classify(&records, &[], &warning);
        // Only temperature exceeds; that alone makes D a warning
        assert_eq!(rows[3].health_status, HealthStatus::Warning);
        assert_eq!(rows[0].health_status, HealthStatus::Normal);
    }

    #[test]
    fn test_single_row_is_normal() {
        let records = vec![record("A", 42.0, 1.0, 2.0)];
        let warning = thresholds_for(&records, 0.75);
        let rows = classify(&records, &[], &warning);
        // The row equals the percentile value in every column; strictly
        // greater never fires.
        assert_eq!(rows[0].health_status, HealthStatus::Normal);
    }

    #[test]
    fn test_empty_thresholds_never_warn() {
        let warning = thresholds_for(&[], 0.75);
        assert!(!warning.exceeded_by(&record("A", 1e9, 1e9, 1e9)));
    }

    #[test]
    fn test_duplicate_names_share_critical() {
        let records = vec![
            record("A", 10.0, 100.0, 50.0),
            record("A", 11.0, 101.0, 51.0),
            record("B", 12.0, 102.0, 52.0),
        ];
        let warning = thresholds_for(&records, 0.95);
        let rows = classify(&records, &[outlier_for("A")], &warning);
        assert_eq!(rows[0].health_status, HealthStatus::Critical);
        assert_eq!(rows[1].health_status, HealthStatus::Critical);
    }
}
