//! Core data model for equipment telemetry analysis.
//!
//! One `EquipmentRecord` per input row, the derived per-column and per-type
//! aggregates, and the assembled `AnalysisSummary` that downstream consumers
//! (report renderers, dashboards, the history store) persist or display.
//!
//! Values that are statistically undefined (sample stddev with n <= 1,
//! correlation with fewer than two rows or zero variance, any aggregate over
//! an empty dataset) are `Option<f64>` and serialize as JSON `null` - never
//! a fabricated number.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod thresholds;

pub use thresholds::{ConfigError, ThresholdConfig};

// ============================================================================
// Input Rows
// ============================================================================

/// One validated input row: a piece of equipment and its three sensor
/// readings. All numeric fields are finite (enforced at ingestion).
///
/// Names are unique by convention, not enforced; duplicate names share
/// outlier membership and therefore health status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    /// Equipment name ("Equipment Name" column)
    pub name: String,
    /// Category ("Type" column), e.g. "Pump", "Valve"
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// The three numeric sensor columns, in fixed pipeline order.
///
/// The order here is the scan order everywhere (statistics, correlation
/// matrix axes, outlier parameter accumulation), so output is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericColumn {
    Flowrate,
    Pressure,
    Temperature,
}

impl NumericColumn {
    /// All numeric columns in scan order.
    pub const ALL: [Self; 3] = [Self::Flowrate, Self::Pressure, Self::Temperature];

    /// Column header as it appears in the input table and in output keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flowrate => "Flowrate",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
        }
    }

    /// Read this column's value from a record.
    #[must_use]
    pub const fn value(self, record: &EquipmentRecord) -> f64 {
        match self {
            Self::Flowrate => record.flowrate,
            Self::Pressure => record.pressure,
            Self::Temperature => record.temperature,
        }
    }
}

impl std::fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Derived Statistics
// ============================================================================

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    /// `None` for an empty column
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sample standard deviation (n-1 denominator); `None` when count <= 1
    pub stddev: Option<f64>,
}

/// Aggregate statistics for one equipment type (category).
///
/// Independent of dataset-wide quantiles; a type only exists here if at
/// least one row carries it, so `count >= 1` and the means are defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeGroupStats {
    pub count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
}

/// A single out-of-bound value on one column of one equipment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierParameter {
    pub parameter: NumericColumn,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// One entry per equipment row with at least one out-of-bound column.
///
/// `parameters` accumulates every triggering column for the row, in column
/// scan order - not just the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierEntry {
    pub equipment: String,
    pub parameters: Vec<OutlierParameter>,
}

// ============================================================================
// Health Classification
// ============================================================================

/// Per-row health classification.
///
/// Derives `Ord` so `Critical > Warning > Normal` is the severity order;
/// consumers map ranks to their own visual encoding (colors are a
/// presentation concern, not part of this contract).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Normal,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Presentation-neutral severity rank: normal=0, warning=1, critical=2.
    #[must_use]
    pub const fn severity_rank(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An input row plus its derived health classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    #[serde(flatten)]
    pub record: EquipmentRecord,
    pub health_status: HealthStatus,
}

// ============================================================================
// Analysis Summary
// ============================================================================

/// The full analysis output for one dataset snapshot.
///
/// Produced once per run and immutable thereafter; the engine holds no state
/// across runs. All maps are `BTreeMap` so serializing the same input twice
/// yields byte-identical JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_count: usize,

    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,

    pub min_flowrate: Option<f64>,
    pub max_flowrate: Option<f64>,
    pub std_flowrate: Option<f64>,
    pub min_pressure: Option<f64>,
    pub max_pressure: Option<f64>,
    pub std_pressure: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub std_temperature: Option<f64>,

    /// Row count per distinct `Type`; values sum to `total_count`
    pub type_distribution: BTreeMap<String, usize>,
    /// Per-type aggregates, independent of global statistics
    pub type_comparison: BTreeMap<String, TypeGroupStats>,
    /// 3x3 symmetric Pearson matrix; diagonal exactly 1.0, undefined
    /// entries are `null`
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    /// Ordered by first trigger (column scan order, then row order)
    pub outliers: Vec<OutlierEntry>,
    /// The configuration snapshot this run used
    pub thresholds: ThresholdConfig,
}

impl AnalysisSummary {
    /// Column statistics for one numeric column, reassembled from the flat
    /// summary fields.
    #[must_use]
    pub fn column_stats(&self, column: NumericColumn) -> ColumnStats {
        let (mean, min, max, stddev) = match column {
            NumericColumn::Flowrate => (
                self.avg_flowrate,
                self.min_flowrate,
                self.max_flowrate,
                self.std_flowrate,
            ),
            NumericColumn::Pressure => (
                self.avg_pressure,
                self.min_pressure,
                self.max_pressure,
                self.std_pressure,
            ),
            NumericColumn::Temperature => (
                self.avg_temperature,
                self.min_temperature,
                self.max_temperature,
                self.std_temperature,
            ),
        };
        ColumnStats {
            count: self.total_count,
            mean,
            min,
            max,
            stddev,
        }
    }

    /// Whether an equipment name was flagged by the outlier detector.
    #[must_use]
    pub fn is_outlier(&self, equipment: &str) -> bool {
        self.outliers.iter().any(|o| o.equipment == equipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(HealthStatus::Critical > HealthStatus::Warning);
        assert!(HealthStatus::Warning > HealthStatus::Normal);
        assert_eq!(HealthStatus::Normal.severity_rank(), 0);
        assert_eq!(HealthStatus::Warning.severity_rank(), 1);
        assert_eq!(HealthStatus::Critical.severity_rank(), 2);
    }

    #[test]
    fn test_health_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_annotated_row_flattens_record() {
        let row = AnnotatedRow {
            record: EquipmentRecord {
                name: "P-101".to_string(),
                equipment_type: "Pump".to_string(),
                flowrate: 10.0,
                pressure: 100.0,
                temperature: 50.0,
            },
            health_status: HealthStatus::Normal,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["name"], "P-101");
        assert_eq!(value["health_status"], "normal");
    }

    #[test]
    fn test_column_accessor() {
        let record = EquipmentRecord {
            name: "V-1".to_string(),
            equipment_type: "Valve".to_string(),
            flowrate: 1.0,
            pressure: 2.0,
            temperature: 3.0,
        };
        assert_eq!(NumericColumn::Flowrate.value(&record), 1.0);
        assert_eq!(NumericColumn::Pressure.value(&record), 2.0);
        assert_eq!(NumericColumn::Temperature.value(&record), 3.0);
    }
}
