//! Admin-triggered feed sync (lenient path)
//!
//! POST /api/admin/sync-players, optional JSON body `{ "mode": "additive" }`.
//! A missing or unreadable body means replace mode.

use axum::{body::Bytes, extract::State, Extension, Json};
use bbq_common::api::Caller;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::SYNC_RUNNING;
use crate::csv::FEED_COLUMNS;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::{sync_from_feed, PipelineError};
use crate::reconcile::ReconcileMode;
use crate::AppState;

/// Request body
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    pub mode: Option<String>,
}

/// Successful sync summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: u64,
    pub synced_at: String,
}

fn sync_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::Upstream(e) => {
            warn!("Player feed unavailable: {}", e);
            ApiError::Upstream(e.to_string())
        }
        PipelineError::MissingColumns(missing) => ApiError::Unprocessable(format!(
            "Missing required columns: {}. First {} headers found: {}",
            missing.missing.join(", "),
            FEED_COLUMNS.header_echo_limit,
            missing.found.join(", ")
        )),
        PipelineError::NoDataRows | PipelineError::EmptyBatch => {
            ApiError::Unprocessable(err.to_string())
        }
        PipelineError::Validation(report) => ApiError::Validation(report),
        PipelineError::Store(e) => ApiError::Common(e),
        PipelineError::Busy => ApiError::Conflict(SYNC_RUNNING.to_string()),
    }
}

/// POST /api/admin/sync-players
pub async fn sync_players(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> ApiResult<Json<SyncResponse>> {
    let request: SyncRequest = serde_json::from_slice(&body).unwrap_or_default();
    let mode = ReconcileMode::from_flag(request.mode.as_deref());

    info!(
        user = caller.user_id.as_deref().unwrap_or("-"),
        url = state.feed.url(),
        mode = mode.as_str(),
        "Player feed sync requested"
    );

    let summary = sync_from_feed(&state.db, &state.feed, &state.lease, mode, state.batch_size)
        .await
        .map_err(sync_error)?;

    Ok(Json(SyncResponse {
        total: summary.total,
        inserted: summary.inserted,
        updated: summary.updated,
        deleted: summary.deleted,
        synced_at: summary
            .completed_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}
