//! Player universe reconciliation
//!
//! Turns a validated batch into store mutations:
//! 1. Bulk-fetch which batch ids already exist (one query)
//! 2. Classify inserted / updated counts up front
//! 3. Upsert in fixed-size chunks, one transaction per chunk
//! 4. `Replace` mode only: soft-delete live players absent from the batch
//!
//! Chunks commit independently. A failure in a later chunk leaves earlier
//! chunks written and is returned to the caller as a store error.

use bbq_common::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::csv::Field;
use crate::db::players;
use crate::normalize::PlayerRecord;

/// Records per upsert transaction
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// What happens to stored players missing from the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Absent players are soft-deleted
    #[default]
    Replace,
    /// Only inserts and updates
    Additive,
}

impl ReconcileMode {
    /// Exactly `"additive"` selects additive; anything else is replace
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("additive") => ReconcileMode::Additive,
            _ => ReconcileMode::Replace,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileMode::Replace => "replace",
            ReconcileMode::Additive => "additive",
        }
    }
}

/// Counts reported after a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: u64,
    pub completed_at: DateTime<Utc>,
}

/// Collapse duplicate ids, keeping the last occurrence of each
///
/// Returns the deduplicated batch and the number of rows dropped.
pub fn collapse_duplicates(records: Vec<PlayerRecord>) -> (Vec<PlayerRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);

    let mut kept: Vec<PlayerRecord> = records
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.sfbb_id.clone()))
        .collect();
    kept.reverse();

    let dropped = before - kept.len();
    (kept, dropped)
}

/// Reconciles batches into the player store
pub struct Reconciler<'a> {
    pool: &'a SqlitePool,
    batch_size: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Apply `records` to the store. `fields` are the fields this entry
    /// point manages; other stored columns are left untouched on update.
    ///
    /// The batch must be non-empty and already validated.
    pub async fn apply(
        &self,
        records: Vec<PlayerRecord>,
        fields: &[Field],
        mode: ReconcileMode,
    ) -> Result<ReconcileSummary> {
        let (records, dropped) = collapse_duplicates(records);
        if dropped > 0 {
            warn!(dropped, "Collapsed duplicate player ids in batch (last row wins)");
        }

        let ids: Vec<&str> = records.iter().map(|r| r.sfbb_id.as_str()).collect();

        let existing = players::existing_sfbb_ids(self.pool, &ids).await?;
        let updated = ids.iter().filter(|id| existing.contains(**id)).count();
        let inserted = ids.len() - updated;

        info!(
            mode = mode.as_str(),
            total = ids.len(),
            inserted,
            updated,
            "Reconciling player batch"
        );

        let sql = players::upsert_sql(fields);
        let chunk_count = records.len().div_ceil(self.batch_size);

        for (n, chunk) in records.chunks(self.batch_size).enumerate() {
            let mut tx = self.pool.begin().await?;
            for record in chunk {
                players::upsert_player(&mut *tx, &sql, record, fields).await?;
            }
            tx.commit().await?;

            debug!(
                chunk = n + 1,
                chunks = chunk_count,
                rows = chunk.len(),
                "Committed upsert chunk"
            );
        }

        let deleted = match mode {
            ReconcileMode::Replace => players::soft_delete_absent(self.pool, &ids).await?,
            ReconcileMode::Additive => 0,
        };

        let summary = ReconcileSummary {
            total: ids.len(),
            inserted,
            updated,
            deleted,
            completed_at: Utc::now(),
        };

        info!(
            total = summary.total,
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "Player batch reconciled"
        );

        Ok(summary)
    }
}

/// Serializes reconciliation runs within this process
///
/// Two concurrent replace-mode runs would race on the soft-delete step, so
/// only one run may hold the lease at a time. Runs in other processes
/// sharing the database are not covered.
#[derive(Debug, Clone, Default)]
pub struct ReconcileLease {
    inner: Arc<Mutex<()>>,
}

impl ReconcileLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease without waiting; `None` when a run is in progress
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        self.inner.clone().try_lock_owned().ok()
    }
}
