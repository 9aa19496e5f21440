//! The analytics engine: validated rows + threshold snapshot in, immutable
//! summary + annotated rows out.
//!
//! Single-pass pipeline per analysis run:
//!
//! ```text
//! records -> column stats -> type comparison -> correlation matrix
//!         -> outlier detection (reuses column quantiles)
//!         -> health classification (outliers + dataset-wide percentiles)
//!         -> AnalysisSummary + annotated rows
//! ```
//!
//! The whole run is a pure synchronous function of its inputs: no I/O, no
//! shared state, no partial output. Callers that want cancellation simply
//! abandon the call; callers that want parallelism run independent datasets
//! concurrently.

pub mod column_stats;
pub mod correlation;
pub mod groups;
pub mod health;
pub mod outliers;

use crate::types::{
    AnalysisSummary, AnnotatedRow, EquipmentRecord, NumericColumn, ThresholdConfig,
};
use tracing::{debug, info};

pub use health::WarningThresholds;
pub use outliers::ColumnBounds;

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub summary: AnalysisSummary,
    pub rows: Vec<AnnotatedRow>,
}

/// Run the full pipeline over one dataset snapshot.
///
/// Deterministic: identical (records, config) inputs produce byte-identical
/// serialized output. An empty dataset is accepted and yields a summary
/// with every aggregate undefined, zero outliers and no rows.
#[must_use]
pub fn analyze(records: &[EquipmentRecord], config: ThresholdConfig) -> AnalysisOutput {
    // Sorted copies of each column, shared by quartile and percentile
    // queries so nothing is re-sorted downstream.
    let sorted_columns: [Vec<f64>; 3] = [
        column_stats::sorted_column(records, NumericColumn::Flowrate),
        column_stats::sorted_column(records, NumericColumn::Pressure),
        column_stats::sorted_column(records, NumericColumn::Temperature),
    ];

    let column_values = |column: NumericColumn| -> Vec<f64> {
        records.iter().map(|r| column.value(r)).collect()
    };
    let flowrate = column_stats::column_stats(&column_values(NumericColumn::Flowrate));
    let pressure = column_stats::column_stats(&column_values(NumericColumn::Pressure));
    let temperature = column_stats::column_stats(&column_values(NumericColumn::Temperature));

    let type_distribution = column_stats::type_distribution(records);
    let type_comparison = groups::type_comparison(records);
    let correlation_matrix = correlation::correlation_matrix(records);

    // Bounds once per column, then a single scan for out-of-bound rows
    let bounds: Vec<ColumnBounds> = NumericColumn::ALL
        .iter()
        .zip(sorted_columns.iter())
        .filter_map(|(&column, sorted)| {
            outliers::column_bounds(sorted, column, config.outlier_iqr_multiplier)
        })
        .collect();
    let outlier_entries = outliers::detect(records, &bounds);

    let warning = WarningThresholds::compute(&sorted_columns, config.warning_percentile);
    let rows = health::classify(records, &outlier_entries, &warning);

    debug!(
        rows = records.len(),
        types = type_distribution.len(),
        "assembled analysis summary"
    );
    info!(
        total = records.len(),
        outliers = outlier_entries.len(),
        warning_percentile = config.warning_percentile,
        iqr_multiplier = config.outlier_iqr_multiplier,
        "analysis run complete"
    );

    let summary = AnalysisSummary {
        total_count: records.len(),
        avg_flowrate: flowrate.mean,
        avg_pressure: pressure.mean,
        avg_temperature: temperature.mean,
        min_flowrate: flowrate.min,
        max_flowrate: flowrate.max,
        std_flowrate: flowrate.stddev,
        min_pressure: pressure.min,
        max_pressure: pressure.max,
        std_pressure: pressure.stddev,
        min_temperature: temperature.min,
        max_temperature: temperature.max,
        std_temperature: temperature.stddev,
        type_distribution,
        type_comparison,
        correlation_matrix,
        outliers: outlier_entries,
        thresholds: config,
    };

    AnalysisOutput { summary, rows }
}
