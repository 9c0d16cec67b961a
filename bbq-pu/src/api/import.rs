//! Admin CSV upload (strict path)
//!
//! POST /api/players/import, multipart form:
//! - `file`: the CSV (required)
//! - `mode`: `replace` (default) or `additive`
//!
//! Any field-level validation error rejects the whole upload with 422 and
//! nothing is written.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use bbq_common::api::Caller;
use serde::Serialize;
use tracing::info;

use crate::api::SYNC_RUNNING;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::{PipelineError, PlayerPipeline};
use crate::reconcile::ReconcileMode;
use crate::AppState;

/// Successful upload summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: u64,
    pub imported_at: String,
}

fn upload_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::NoDataRows => ApiError::BadRequest(err.to_string()),
        PipelineError::MissingColumns(missing) => {
            let expected: Vec<String> = missing
                .expected
                .iter()
                .map(|label| format!("\"{}\"", label))
                .collect();
            ApiError::BadRequest(format!(
                "Missing required columns. Expected {}. Found: {}",
                expected.join(" and "),
                missing.found.join(", ")
            ))
        }
        PipelineError::Validation(report) => ApiError::Validation(report),
        PipelineError::EmptyBatch => ApiError::BadRequest(err.to_string()),
        PipelineError::Upstream(e) => ApiError::Upstream(e.to_string()),
        PipelineError::Store(e) => ApiError::Common(e),
        PipelineError::Busy => ApiError::Conflict(SYNC_RUNNING.to_string()),
    }
}

/// POST /api/players/import
pub async fn import_players(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ImportResponse>> {
    let mut multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;

    let mut mode_flag: Option<String> = None;
    let mut file_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        let is_file = field.file_name().is_some();

        match name.as_deref() {
            Some("mode") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid mode field: {}", e)))?;
                mode_flag = Some(value);
            }
            // A plain text part named "file" is not an upload
            Some("file") if is_file => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid file field: {}", e)))?;
                file_text = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            _ => {}
        }
    }

    let text = file_text.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let mode = ReconcileMode::from_flag(mode_flag.as_deref());

    let _lease = state
        .lease
        .try_acquire()
        .ok_or_else(|| ApiError::Conflict(SYNC_RUNNING.to_string()))?;

    info!(
        user = caller.user_id.as_deref().unwrap_or("-"),
        bytes = text.len(),
        mode = mode.as_str(),
        "Player CSV upload received"
    );

    let summary = PlayerPipeline::admin_upload(&state.db)
        .with_batch_size(state.batch_size)
        .run(&text, mode)
        .await
        .map_err(upload_error)?;

    Ok(Json(ImportResponse {
        total: summary.total,
        inserted: summary.inserted,
        updated: summary.updated,
        deleted: summary.deleted,
        imported_at: summary
            .completed_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}
