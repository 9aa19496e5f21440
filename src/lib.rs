//! Fleetscope: equipment fleet telemetry analytics.
//!
//! Turns periodic batch exports of equipment telemetry (one row per piece
//! of equipment: name, type, flowrate, pressure, temperature) into a
//! derived analytical summary for fleet operators.
//!
//! ## Architecture
//!
//! - **Ingestion**: CSV parsing and all-or-nothing schema/type validation
//! - **Analytics Engine**: descriptive statistics, per-type comparison,
//!   Pearson correlation matrix, IQR outlier detection, layered health
//!   classification - a pure function of (rows, threshold snapshot)
//! - **History Store**: per-owner retention of completed runs with atomic
//!   sequencing and cascading cleanup

pub mod analytics;
pub mod ingest;
pub mod store;
pub mod types;

// Re-export the engine entry point
pub use analytics::{analyze, AnalysisOutput};

// Re-export commonly used types
pub use types::{
    AnalysisSummary, AnnotatedRow, ColumnStats, ConfigError, EquipmentRecord, HealthStatus,
    NumericColumn, OutlierEntry, OutlierParameter, ThresholdConfig, TypeGroupStats,
};

// Re-export ingestion
pub use ingest::{load_csv, validate, IngestError, RawTable, REQUIRED_COLUMNS};

// Re-export storage
pub use store::{AnalysisStore, StoreError, StoredAnalysis};
