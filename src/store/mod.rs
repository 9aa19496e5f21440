//! Analysis history store.
//!
//! Persists completed analysis runs per owner with a bounded retention
//! window (most recent N, default 5), mirroring what the engine's callers
//! expect from a batch-export workflow:
//!
//! - **Atomic sequence**: each owner has a monotonically increasing
//!   sequence advanced by a single conditional update
//!   (`sled::Tree::update_and_fetch`), never a read-then-write of a
//!   maximum, so concurrent saves cannot collide on an index.
//! - **All-or-nothing writes**: the summary and annotated rows live in one
//!   record, inserted in one transaction together with the raw source
//!   blob. A failed run persists nothing; there is no state where rows
//!   exist without a summary or vice versa.
//! - **Cascading cleanup**: deleting an analysis removes the record and
//!   its source blob in the same transaction, on every path (explicit
//!   delete and retention pruning alike).
//!
//! Keys are `owner \0 seq(be64)` so `scan_prefix(owner)` walks one owner's
//! records in chronological order.

use crate::analytics::AnalysisOutput;
use crate::types::{AnalysisSummary, AnnotatedRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Analyses kept per owner unless overridden
pub const DEFAULT_RETENTION: usize = 5;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("owner name must not contain a NUL byte")]
    InvalidOwner,
}

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Self::Database(e),
        }
    }
}

/// One persisted analysis run: identity, provenance, and the complete
/// engine output. Summary and rows always travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub owner: String,
    pub seq: u64,
    /// Name of the source export (e.g. the uploaded CSV's file name)
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub summary: AnalysisSummary,
    pub rows: Vec<AnnotatedRow>,
}

/// Per-owner analysis history backed by sled.
#[derive(Clone)]
pub struct AnalysisStore {
    analyses: sled::Tree,
    sources: sled::Tree,
    sequences: sled::Tree,
    retention: usize,
}

impl AnalysisStore {
    /// Open or create the store at the specified path with default
    /// retention.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self {
            analyses: db.open_tree("analyses")?,
            sources: db.open_tree("sources")?,
            sequences: db.open_tree("sequences")?,
            retention: DEFAULT_RETENTION,
        })
    }

    /// Override how many analyses are kept per owner (minimum 1).
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// Persist one completed run for `owner`, returning the stored record.
    ///
    /// Advances the owner's sequence atomically, writes the record and its
    /// source blob in one transaction, then prunes anything older than the
    /// retention window.
    pub fn save(
        &self,
        owner: &str,
        source_name: &str,
        source: &[u8],
        output: &AnalysisOutput,
    ) -> Result<StoredAnalysis, StoreError> {
        let seq = self.next_seq(owner)?;
        let record = StoredAnalysis {
            owner: owner.to_string(),
            seq,
            source_name: source_name.to_string(),
            created_at: Utc::now(),
            summary: output.summary.clone(),
            rows: output.rows.clone(),
        };

        let key = record_key(owner, seq)?;
        let value = serde_json::to_vec(&record)?;

        (&self.analyses, &self.sources)
            .transaction(|(analyses, sources)| {
                analyses.insert(key.as_slice(), value.as_slice())?;
                sources.insert(key.as_slice(), source)?;
                Ok::<_, ConflictableTransactionError<StoreError>>(())
            })
            .map_err(StoreError::from)?;

        let pruned = self.prune(owner)?;
        info!(owner, seq, pruned, "analysis persisted");
        Ok(record)
    }

    /// Fetch one analysis by sequence number.
    pub fn get(&self, owner: &str, seq: u64) -> Result<Option<StoredAnalysis>, StoreError> {
        let key = record_key(owner, seq)?;
        match self.analyses.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// The raw source blob behind one analysis.
    pub fn get_source(&self, owner: &str, seq: u64) -> Result<Option<Vec<u8>>, StoreError> {
        let key = record_key(owner, seq)?;
        Ok(self.sources.get(key)?.map(|v| v.to_vec()))
    }

    /// Most recent analyses for an owner, newest first.
    pub fn list_recent(
        &self,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<StoredAnalysis>, StoreError> {
        let prefix = owner_prefix(owner)?;
        let mut records = Vec::new();
        for item in self.analyses.scan_prefix(&prefix).rev() {
            if records.len() >= limit {
                break;
            }
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    /// Number of analyses currently stored for an owner.
    pub fn count(&self, owner: &str) -> Result<usize, StoreError> {
        let prefix = owner_prefix(owner)?;
        Ok(self.analyses.scan_prefix(&prefix).count())
    }

    /// Delete one analysis and its source blob. Returns whether a record
    /// existed. Both removals happen in one transaction - a record is
    /// never left behind without its blob or vice versa.
    pub fn delete(&self, owner: &str, seq: u64) -> Result<bool, StoreError> {
        let key = record_key(owner, seq)?;
        let existed = (&self.analyses, &self.sources)
            .transaction(|(analyses, sources)| {
                let removed = analyses.remove(key.as_slice())?.is_some();
                sources.remove(key.as_slice())?;
                Ok::<_, ConflictableTransactionError<StoreError>>(removed)
            })
            .map_err(StoreError::from)?;
        if existed {
            debug!(owner, seq, "analysis deleted");
        }
        Ok(existed)
    }

    /// Advance the owner's sequence with a single atomic conditional
    /// update and return the new value.
    fn next_seq(&self, owner: &str) -> Result<u64, StoreError> {
        if owner.as_bytes().contains(&0) {
            return Err(StoreError::InvalidOwner);
        }
        let updated = self.sequences.update_and_fetch(owner, |old| {
            let current = old.map_or(0, decode_seq);
            Some(current.wrapping_add(1).to_be_bytes().to_vec())
        })?;
        Ok(updated.as_deref().map_or(1, decode_seq))
    }

    /// Drop this owner's oldest analyses beyond the retention window.
    /// Each removal cascades to the source blob in its own transaction.
    fn prune(&self, owner: &str) -> Result<usize, StoreError> {
        let prefix = owner_prefix(owner)?;
        let keys: Vec<sled::IVec> = self
            .analyses
            .scan_prefix(&prefix)
            .keys()
            .collect::<Result<_, _>>()?;
        if keys.len() <= self.retention {
            return Ok(0);
        }

        let excess = keys.len() - self.retention;
        for key in &keys[..excess] {
            (&self.analyses, &self.sources)
                .transaction(|(analyses, sources)| {
                    analyses.remove(key.as_ref())?;
                    sources.remove(key.as_ref())?;
                    Ok::<_, ConflictableTransactionError<StoreError>>(())
                })
                .map_err(StoreError::from)?;
        }
        debug!(owner, removed = excess, "pruned retention window");
        Ok(excess)
    }
}

fn decode_seq(bytes: &[u8]) -> u64 {
    bytes
        .try_into()
        .map_or(0, u64::from_be_bytes)
}

/// `owner \0` - every key for this owner starts with this.
fn owner_prefix(owner: &str) -> Result<Vec<u8>, StoreError> {
    if owner.as_bytes().contains(&0) {
        return Err(StoreError::InvalidOwner);
    }
    let mut prefix = Vec::with_capacity(owner.len() + 1);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(0);
    Ok(prefix)
}

/// `owner \0 seq(be64)` - big-endian so keys sort chronologically.
fn record_key(owner: &str, seq: u64) -> Result<Vec<u8>, StoreError> {
    let mut key = owner_prefix(owner)?;
    key.extend_from_slice(&seq.to_be_bytes());
    Ok(key)
}
