//! CSV → player store pipeline shared by both entry points
//!
//! text → lines → header resolution → row normalization → reconciliation.
//! The admin upload and the feed sync differ only in their column set and
//! [`FieldPolicy`]; everything else runs through [`PlayerPipeline`].

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::csv::{
    parse_csv_line, split_lines, ColumnMap, ColumnSpec, Field, MissingColumns, FEED_COLUMNS,
    UPLOAD_COLUMNS,
};
use crate::normalize::{FieldPolicy, PlayerRecord, RowNormalizer, ValidationReport};
use crate::reconcile::{
    ReconcileLease, ReconcileMode, ReconcileSummary, Reconciler, DEFAULT_BATCH_SIZE,
};
use crate::services::{FeedClient, FeedError};

/// Why a run stopped before (or while) writing
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fewer than two non-blank lines
    #[error("CSV has no data rows")]
    NoDataRows,

    /// Header lacks a required label
    #[error("{0}")]
    MissingColumns(MissingColumns),

    /// Strict validation failed; nothing written
    #[error("{} validation error(s)", .0.error_count)]
    Validation(ValidationReport),

    /// Every row was skipped
    #[error("No valid rows parsed from CSV")]
    EmptyBatch,

    /// Feed could not be fetched
    #[error(transparent)]
    Upstream(#[from] FeedError),

    /// Database failure during reconciliation
    #[error(transparent)]
    Store(#[from] bbq_common::Error),

    /// Another run holds the reconciliation lease
    #[error("A player sync is already running")]
    Busy,
}

/// One configured CSV → store pipeline
pub struct PlayerPipeline<'a> {
    pool: &'a SqlitePool,
    columns: &'static ColumnSpec,
    policy: FieldPolicy,
    batch_size: usize,
}

impl<'a> PlayerPipeline<'a> {
    /// Strict pipeline for admin CSV uploads
    pub fn admin_upload(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            columns: &UPLOAD_COLUMNS,
            policy: FieldPolicy::Strict,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Lenient pipeline for the SFBB feed
    pub fn feed_sync(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            columns: &FEED_COLUMNS,
            policy: FieldPolicy::Lenient,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Tokenize, resolve and normalize without touching the store
    pub fn parse(&self, text: &str) -> Result<Vec<PlayerRecord>, PipelineError> {
        let lines = split_lines(text);
        let Some((header, data)) = lines.split_first().filter(|(_, data)| !data.is_empty()) else {
            return Err(PipelineError::NoDataRows);
        };

        let map = ColumnMap::resolve(&parse_csv_line(header), self.columns)
            .map_err(PipelineError::MissingColumns)?;

        let records = RowNormalizer::new(&map, self.columns, self.policy)
            .normalize_all(data)
            .map_err(PipelineError::Validation)?;

        if records.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        Ok(records)
    }

    /// Parse `text` and reconcile it into the store
    pub async fn run(&self, text: &str, mode: ReconcileMode) -> Result<ReconcileSummary, PipelineError> {
        let records = self.parse(text)?;
        info!(
            rows = records.len(),
            policy = ?self.policy,
            mode = mode.as_str(),
            "Parsed player CSV"
        );

        let fields: Vec<Field> = self.columns.fields().collect();
        let summary = Reconciler::new(self.pool)
            .with_batch_size(self.batch_size)
            .apply(records, &fields, mode)
            .await?;

        Ok(summary)
    }
}

/// Fetch the SFBB feed and reconcile it
///
/// The lease is taken only after the fetch completes, so a slow upstream
/// never blocks uploads.
pub async fn sync_from_feed(
    pool: &SqlitePool,
    feed: &FeedClient,
    lease: &ReconcileLease,
    mode: ReconcileMode,
    batch_size: usize,
) -> Result<ReconcileSummary, PipelineError> {
    let text = feed.fetch_csv().await?;

    let _lease = lease.try_acquire().ok_or(PipelineError::Busy)?;

    PlayerPipeline::feed_sync(pool)
        .with_batch_size(batch_size)
        .run(&text, mode)
        .await
}
