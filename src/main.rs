//! Fleetscope - Equipment Fleet Telemetry Analytics
//!
//! Batch analysis of equipment telemetry CSV exports.
//!
//! # Usage
//!
//! ```bash
//! # Analyze an export, print the summary and annotated rows as JSON
//! fleetscope analyze fleet.csv
//!
//! # Custom thresholds (out-of-range values are rejected, not clamped)
//! fleetscope analyze fleet.csv --warning-percentile 0.90 --iqr-multiplier 2.0
//!
//! # Persist the run and list history
//! fleetscope analyze fleet.csv --owner ops
//! fleetscope history --owner ops
//! fleetscope delete --owner ops --seq 3
//! ```
//!
//! # Environment Variables
//!
//! - `WARNING_PERCENTILE` / `OUTLIER_IQR_MULTIPLIER`: fallback thresholds
//!   used when no flags are given; malformed or out-of-range values
//!   degrade to the defaults (0.75 / 1.5)
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use fleetscope::{analyze, ingest, AnalysisStore, ThresholdConfig};

/// Default data directory for the analysis history store
const DATA_DIR: &str = "./fleetscope-data";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleetscope")]
#[command(about = "Equipment fleet telemetry analytics")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: SubCommand,

    /// Data directory for the analysis history store
    #[arg(long, default_value = DATA_DIR, global = true)]
    data_dir: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Analyze a telemetry CSV export and print the results as JSON
    Analyze {
        /// Path to the CSV export (Equipment Name, Type, Flowrate,
        /// Pressure, Temperature)
        csv: PathBuf,

        /// Warning percentile (0.50 - 0.95); falls back to
        /// WARNING_PERCENTILE or 0.75 when omitted
        #[arg(long)]
        warning_percentile: Option<f64>,

        /// Outlier IQR multiplier (0.5 - 3.0); falls back to
        /// OUTLIER_IQR_MULTIPLIER or 1.5 when omitted
        #[arg(long)]
        iqr_multiplier: Option<f64>,

        /// Persist the run under this owner (keeps the most recent 5)
        #[arg(long)]
        owner: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List stored analyses for an owner, newest first
    History {
        #[arg(long)]
        owner: String,

        /// Maximum entries to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Delete one stored analysis (and its source) by sequence number
    Delete {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        seq: u64,
    },
}

// ============================================================================
// Threshold Resolution
// ============================================================================

/// Resolve the threshold snapshot for this run.
///
/// Explicit flags are a deliberate save: out-of-range values fail hard with
/// the offending field named. Without flags, the environment is an
/// unreliable source and degrades per-field to the defaults.
fn resolve_thresholds(
    warning_percentile: Option<f64>,
    iqr_multiplier: Option<f64>,
) -> Result<ThresholdConfig> {
    if warning_percentile.is_none() && iqr_multiplier.is_none() {
        let env = |name: &str| std::env::var(name).ok();
        return Ok(ThresholdConfig::parse_or_default(
            env("WARNING_PERCENTILE").as_deref(),
            env("OUTLIER_IQR_MULTIPLIER").as_deref(),
        ));
    }

    let defaults = ThresholdConfig::default();
    let config = ThresholdConfig::validated(
        warning_percentile.unwrap_or(defaults.warning_percentile),
        iqr_multiplier.unwrap_or(defaults.outlier_iqr_multiplier),
    )?;
    Ok(config)
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    match args.command {
        SubCommand::Analyze {
            csv,
            warning_percentile,
            iqr_multiplier,
            owner,
            pretty,
        } => run_analyze(
            &args.data_dir,
            &csv,
            warning_percentile,
            iqr_multiplier,
            owner.as_deref(),
            pretty,
        ),
        SubCommand::History { owner, limit } => run_history(&args.data_dir, &owner, limit),
        SubCommand::Delete { owner, seq } => run_delete(&args.data_dir, &owner, seq),
    }
}

fn run_analyze(
    data_dir: &std::path::Path,
    csv: &std::path::Path,
    warning_percentile: Option<f64>,
    iqr_multiplier: Option<f64>,
    owner: Option<&str>,
    pretty: bool,
) -> Result<()> {
    let config = resolve_thresholds(warning_percentile, iqr_multiplier)?;
    if config.is_custom {
        info!(
            warning_percentile = config.warning_percentile,
            iqr_multiplier = config.outlier_iqr_multiplier,
            "using custom thresholds"
        );
    }

    let table = ingest::load_csv(csv)?;
    let records = ingest::validate(&table)
        .with_context(|| format!("validation failed for {}", csv.display()))?;
    let output = analyze(&records, config);

    if let Some(owner) = owner {
        let store = AnalysisStore::open(data_dir)
            .with_context(|| format!("opening store at {}", data_dir.display()))?;
        let source = std::fs::read(csv)
            .with_context(|| format!("re-reading source {}", csv.display()))?;
        let source_name = csv
            .file_name()
            .map_or_else(|| csv.display().to_string(), |n| n.to_string_lossy().into_owned());
        let saved = store.save(owner, &source_name, &source, &output)?;
        info!(owner, seq = saved.seq, "analysis stored");
    }

    let document = serde_json::json!({
        "summary": output.summary,
        "rows": output.rows,
    });
    let rendered = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_history(data_dir: &std::path::Path, owner: &str, limit: usize) -> Result<()> {
    let store = AnalysisStore::open(data_dir)
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    let records = store.list_recent(owner, limit)?;
    if records.is_empty() {
        warn!(owner, "no stored analyses");
    }
    for record in records {
        println!(
            "{}\t{}\t{}\trows={}\toutliers={}",
            record.seq,
            record.created_at.to_rfc3339(),
            record.source_name,
            record.summary.total_count,
            record.summary.outliers.len(),
        );
    }
    Ok(())
}

fn run_delete(data_dir: &std::path::Path, owner: &str, seq: u64) -> Result<()> {
    let store = AnalysisStore::open(data_dir)
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    if store.delete(owner, seq)? {
        info!(owner, seq, "analysis deleted");
    } else {
        warn!(owner, seq, "no such analysis");
    }
    Ok(())
}
