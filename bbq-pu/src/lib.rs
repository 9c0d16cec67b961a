//! bbq-pu library - Player Universe service
//!
//! Keeps the player universe in sync with the SFBB player ID map, either
//! from an admin CSV upload (strict) or by pulling the feed (lenient), and
//! serves the resulting player store to the admin players table.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod csv;
pub mod db;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod services;

use reconcile::{ReconcileLease, DEFAULT_BATCH_SIZE};
use services::FeedClient;

/// Largest accepted CSV upload. The full SFBB map is a few MB.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Upstream player ID map client
    pub feed: Arc<FeedClient>,
    /// One reconciliation run at a time
    pub lease: ReconcileLease,
    /// Records per upsert transaction
    pub batch_size: usize,
    /// Skip identity checks (local development)
    pub trust_all: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, feed: FeedClient) -> Self {
        Self {
            db,
            feed: Arc::new(feed),
            lease: ReconcileLease::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            trust_all: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_trust_all(mut self, trust_all: bool) -> Self {
        self.trust_all = trust_all;
        self
    }
}

/// Build application router
///
/// Health and build info are public; player reads need an authenticated
/// caller; anything that writes needs an admin.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    let admin = Router::new()
        .route(
            "/api/players/import",
            post(api::import_players).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/admin/sync-players", post(api::sync_players))
        .route("/api/players", post(api::create_player))
        .route(
            "/api/players/:guid",
            delete(api::delete_player).patch(api::update_player),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_admin,
        ));

    let members = Router::new()
        .route("/api/players", get(api::list_players))
        .route("/api/players/:guid", get(api::get_player))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_user,
        ));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(admin)
        .merge(members)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
