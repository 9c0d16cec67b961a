//! Health check endpoint
//!
//! Reports the player store as well as the process: a failing database
//! turns the check into a 503.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// Live players, absent when the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<i64>,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let live: Result<i64, sqlx::Error> =
        sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE deleted_at IS NULL")
            .fetch_one(&state.db)
            .await;

    let (code, status, database, players) = match live {
        Ok(count) => (StatusCode::OK, "ok", "ok", Some(count)),
        Err(e) => {
            warn!("Health check: player store unavailable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable", None)
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            module: "bbq-pu",
            version: env!("CARGO_PKG_VERSION"),
            database,
            players,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
