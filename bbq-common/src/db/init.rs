//! Database initialization
//!
//! Creates the database file and schema on first run; reopening an
//! existing database is a no-op apart from pending migrations.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every connection
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL keeps the players table readable while an import is writing
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe to call on every start
    create_schema_version_table(&pool).await?;
    create_players_table(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Player universe, keyed by the SFBB player id
///
/// `positions` holds a JSON array of position codes. `deleted_at` is the
/// soft-delete marker; rows are never removed by reconciliation.
async fn create_players_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            guid TEXT PRIMARY KEY,
            sfbb_id TEXT NOT NULL UNIQUE,
            player_name TEXT NOT NULL,
            positions TEXT NOT NULL DEFAULT '[]',
            team TEXT,
            mlb_level TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            birthday TEXT,
            mlbam_id INTEGER,
            fangraphs_id INTEGER,
            fangraphs_minors_id TEXT,
            cbs_id INTEGER,
            espn_id INTEGER,
            yahoo_id INTEGER,
            fantrax_id TEXT,
            retro_id TEXT,
            nfbc_id INTEGER,
            bref_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_players_deleted_at ON players(deleted_at)")
        .execute(pool)
        .await?;

    Ok(())
}
