//! HTTP API handlers for bbq-pu

pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod import;
pub mod players;
pub mod sync;

pub use auth::{require_admin, require_user};
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use import::import_players;
pub use players::{create_player, delete_player, get_player, list_players, update_player};
pub use sync::sync_players;

/// Message returned while another reconciliation run holds the lease
pub const SYNC_RUNNING: &str = "A player sync is already running";
