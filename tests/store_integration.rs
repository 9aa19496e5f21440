//! History store integration: retention, atomic sequencing, cascading
//! cleanup, and the no-partial-persist property of the whole pipeline.

use fleetscope::{analyze, ingest, AnalysisStore, ThresholdConfig};
use std::io::Write;

const FLEET_CSV: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
A,Pump,10,100,50
B,Pump,12,102,52
C,Valve,11,101,51
D,Valve,1000,100,50
";

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// The full caller-side flow: parse, validate, analyze, persist.
fn run_and_store(
    store: &AnalysisStore,
    owner: &str,
    csv: &str,
) -> Result<u64, Box<dyn std::error::Error>> {
    let file = write_csv(csv);
    let table = ingest::load_csv(file.path())?;
    let records = ingest::validate(&table)?;
    let output = analyze(&records, ThresholdConfig::default());
    let saved = store.save(owner, "fleet.csv", csv.as_bytes(), &output)?;
    Ok(saved.seq)
}

#[test]
fn retention_keeps_five_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap();

    for _ in 0..7 {
        run_and_store(&store, "ops", FLEET_CSV).unwrap();
    }

    assert_eq!(store.count("ops").unwrap(), 5);
    let recent = store.list_recent("ops", 10).unwrap();
    let seqs: Vec<u64> = recent.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![7, 6, 5, 4, 3]);

    // Pruned runs released their source blobs too
    assert!(store.get_source("ops", 1).unwrap().is_none());
    assert!(store.get_source("ops", 2).unwrap().is_none());
    assert_eq!(
        store.get_source("ops", 7).unwrap().unwrap(),
        FLEET_CSV.as_bytes()
    );
}

#[test]
fn sequences_never_repeat_even_after_pruning() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap().with_retention(2);

    let mut seqs = Vec::new();
    for _ in 0..6 {
        seqs.push(run_and_store(&store, "ops", FLEET_CSV).unwrap());
    }
    // Strictly increasing: pruning old records must not recycle indices
    // the way a max-aggregate query would.
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn validation_failure_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap();

    let bad_csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
A,Pump,10,not-a-number,50
";
    let result = run_and_store(&store, "ops", bad_csv);
    assert!(result.is_err());

    // The failed run left no record, no rows, no source blob
    assert_eq!(store.count("ops").unwrap(), 0);
    assert!(store.list_recent("ops", 10).unwrap().is_empty());
    assert!(store.get_source("ops", 1).unwrap().is_none());

    // And the next successful run starts cleanly
    let seq = run_and_store(&store, "ops", FLEET_CSV).unwrap();
    let loaded = store.get("ops", seq).unwrap().unwrap();
    assert_eq!(loaded.summary.total_count, loaded.rows.len());
}

#[test]
fn summary_and_rows_are_never_split() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap();

    run_and_store(&store, "ops", FLEET_CSV).unwrap();
    for record in store.list_recent("ops", 10).unwrap() {
        // One record carries both; a summary without rows (or rows
        // without a summary) cannot be represented.
        assert_eq!(record.summary.total_count, record.rows.len());
        assert!(store.get_source("ops", record.seq).unwrap().is_some());
    }
}

#[test]
fn delete_releases_backing_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap();

    let seq = run_and_store(&store, "ops", FLEET_CSV).unwrap();
    assert!(store.get_source("ops", seq).unwrap().is_some());

    assert!(store.delete("ops", seq).unwrap());
    assert!(store.get("ops", seq).unwrap().is_none());
    assert!(store.get_source("ops", seq).unwrap().is_none());
}

#[test]
fn owners_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap().with_retention(2);

    for _ in 0..3 {
        run_and_store(&store, "day-shift", FLEET_CSV).unwrap();
    }
    run_and_store(&store, "night-shift", FLEET_CSV).unwrap();

    assert_eq!(store.count("day-shift").unwrap(), 2);
    assert_eq!(store.count("night-shift").unwrap(), 1);
    assert_eq!(store.list_recent("night-shift", 10).unwrap()[0].seq, 1);
}

#[test]
fn stored_analysis_roundtrips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path()).unwrap();

    let seq = run_and_store(&store, "ops", FLEET_CSV).unwrap();
    let loaded = store.get("ops", seq).unwrap().unwrap();

    assert_eq!(loaded.owner, "ops");
    assert_eq!(loaded.summary.outliers.len(), 1);
    assert_eq!(loaded.summary.outliers[0].equipment, "D");
    assert!(loaded.summary.is_outlier("D"));
    assert_eq!(loaded.rows.len(), 4);
}
