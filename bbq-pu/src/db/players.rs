//! Player store operations
//!
//! Id lists are bound as a single JSON array and expanded with
//! `json_each`, so batch size never runs into SQLite's bound-parameter
//! limit.

use bbq_common::db::{Player, PLAYER_COLUMNS};
use bbq_common::Result;
use chrono::NaiveDate;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::{QueryBuilder, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::csv::Field;
use crate::normalize::PlayerRecord;

/// SFBB ids from `ids` already present in the store, soft-deleted or not
pub async fn existing_sfbb_ids(pool: &SqlitePool, ids: &[&str]) -> Result<HashSet<String>> {
    let ids_json = serde_json::to_string(ids)?;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT sfbb_id FROM players WHERE sfbb_id IN (SELECT value FROM json_each(?))",
    )
    .bind(ids_json)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Build the upsert statement for the managed `fields`
///
/// Only managed fields are written; on update the soft-delete marker is
/// always cleared.
pub fn upsert_sql(fields: &[Field]) -> String {
    let data_fields: Vec<Field> = fields
        .iter()
        .copied()
        .filter(|f| *f != Field::ExternalId)
        .collect();

    let mut columns = vec!["guid", "sfbb_id"];
    columns.extend(data_fields.iter().map(|f| f.db_column()));

    let placeholders = vec!["?"; columns.len()].join(", ");

    let mut updates: Vec<String> = data_fields
        .iter()
        .map(|f| format!("{col} = excluded.{col}", col = f.db_column()))
        .collect();
    updates.push("updated_at = CURRENT_TIMESTAMP".to_string());
    updates.push("deleted_at = NULL".to_string());

    format!(
        "INSERT INTO players ({}, created_at, updated_at) VALUES ({}, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) \
         ON CONFLICT(sfbb_id) DO UPDATE SET {}",
        columns.join(", "),
        placeholders,
        updates.join(", ")
    )
}

fn bind_field<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q PlayerRecord,
    field: Field,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    Ok(match field {
        Field::ExternalId => query.bind(&record.sfbb_id),
        Field::DisplayName => query.bind(&record.player_name),
        Field::Positions => query.bind(serde_json::to_string(&record.positions)?),
        Field::Team => query.bind(&record.team),
        Field::MlbLevel => query.bind(&record.mlb_level),
        Field::Active => query.bind(record.active),
        Field::Birthday => query.bind(record.birthday.map(format_date)),
        Field::MlbamId => query.bind(record.mlbam_id),
        Field::FangraphsId => query.bind(record.fangraphs_id),
        Field::FangraphsMinorsId => query.bind(&record.fangraphs_minors_id),
        Field::CbsId => query.bind(record.cbs_id),
        Field::EspnId => query.bind(record.espn_id),
        Field::YahooId => query.bind(record.yahoo_id),
        Field::FantraxId => query.bind(&record.fantrax_id),
        Field::RetroId => query.bind(&record.retro_id),
        Field::NfbcId => query.bind(record.nfbc_id),
        Field::BrefId => query.bind(&record.bref_id),
    })
}

/// Insert or update one player inside the caller's transaction
pub async fn upsert_player(
    conn: &mut SqliteConnection,
    sql: &str,
    record: &PlayerRecord,
    fields: &[Field],
) -> Result<()> {
    let mut query = sqlx::query(sql)
        .bind(Uuid::new_v4().to_string())
        .bind(&record.sfbb_id);

    for field in fields.iter().copied().filter(|f| *f != Field::ExternalId) {
        query = bind_field(query, record, field)?;
    }

    query.execute(&mut *conn).await?;
    Ok(())
}

/// Soft-delete every live player whose SFBB id is not in `keep_ids`
///
/// Returns the number of players marked deleted.
pub async fn soft_delete_absent(pool: &SqlitePool, keep_ids: &[&str]) -> Result<u64> {
    let ids_json = serde_json::to_string(keep_ids)?;

    let result = sqlx::query(
        r#"
        UPDATE players
        SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE deleted_at IS NULL
          AND sfbb_id NOT IN (SELECT value FROM json_each(?))
        "#,
    )
    .bind(ids_json)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Escape LIKE wildcards so user search text matches literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// One page of live players ordered by name, with the total match count
pub async fn list_players(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Player>, i64)> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM players
        WHERE deleted_at IS NULL
          AND (? IS NULL OR player_name LIKE ? ESCAPE '\')
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        r#"
        SELECT {} FROM players
        WHERE deleted_at IS NULL
          AND (? IS NULL OR player_name LIKE ? ESCAPE '\')
        ORDER BY player_name COLLATE NOCASE ASC, sfbb_id ASC
        LIMIT ? OFFSET ?
        "#,
        PLAYER_COLUMNS
    );

    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let players = rows.iter().map(Player::from_row).collect::<Result<Vec<_>>>()?;

    Ok((players, total))
}

/// Live player by guid
pub async fn get_player(pool: &SqlitePool, guid: &str) -> Result<Option<Player>> {
    let sql = format!(
        "SELECT {} FROM players WHERE guid = ? AND deleted_at IS NULL",
        PLAYER_COLUMNS
    );

    let row = sqlx::query(&sql).bind(guid).fetch_optional(pool).await?;

    row.as_ref().map(Player::from_row).transpose()
}

/// Player by SFBB id, including soft-deleted rows
pub async fn get_player_by_sfbb_id(pool: &SqlitePool, sfbb_id: &str) -> Result<Option<Player>> {
    let sql = format!("SELECT {} FROM players WHERE sfbb_id = ?", PLAYER_COLUMNS);

    let row = sqlx::query(&sql).bind(sfbb_id).fetch_optional(pool).await?;

    row.as_ref().map(Player::from_row).transpose()
}

/// Insert one new player
///
/// Returns `None` when the SFBB id is already taken, live or soft-deleted.
pub async fn insert_player(pool: &SqlitePool, record: &PlayerRecord) -> Result<Option<Player>> {
    let guid = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO players (
            guid, sfbb_id, player_name, positions, active, birthday,
            mlbam_id, fangraphs_id, fangraphs_minors_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(sfbb_id) DO NOTHING
        "#,
    )
    .bind(&guid)
    .bind(&record.sfbb_id)
    .bind(&record.player_name)
    .bind(serde_json::to_string(&record.positions)?)
    .bind(record.active)
    .bind(record.birthday.map(format_date))
    .bind(record.mlbam_id)
    .bind(record.fangraphs_id)
    .bind(&record.fangraphs_minors_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_player(pool, &guid).await
}

/// Partial update of one player. `None` leaves a column alone;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerChanges {
    pub player_name: Option<String>,
    pub positions: Option<Vec<String>>,
    pub birthday: Option<Option<NaiveDate>>,
    pub mlbam_id: Option<Option<i64>>,
    pub fangraphs_id: Option<Option<i64>>,
    pub fangraphs_minors_id: Option<Option<String>>,
}

impl PlayerChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Build the UPDATE for `changes`, restricted to the live player `guid`
fn update_query<'a>(guid: &str, changes: &PlayerChanges) -> Result<QueryBuilder<'a, Sqlite>> {
    let mut qb = QueryBuilder::new("UPDATE players SET updated_at = CURRENT_TIMESTAMP");

    if let Some(name) = &changes.player_name {
        qb.push(", player_name = ").push_bind(name.clone());
    }
    if let Some(positions) = &changes.positions {
        qb.push(", positions = ").push_bind(serde_json::to_string(positions)?);
    }
    if let Some(birthday) = changes.birthday {
        qb.push(", birthday = ").push_bind(birthday.map(format_date));
    }
    if let Some(mlbam_id) = changes.mlbam_id {
        qb.push(", mlbam_id = ").push_bind(mlbam_id);
    }
    if let Some(fangraphs_id) = changes.fangraphs_id {
        qb.push(", fangraphs_id = ").push_bind(fangraphs_id);
    }
    if let Some(minors_id) = &changes.fangraphs_minors_id {
        qb.push(", fangraphs_minors_id = ").push_bind(minors_id.clone());
    }

    qb.push(" WHERE guid = ")
        .push_bind(guid.to_string())
        .push(" AND deleted_at IS NULL");
    Ok(qb)
}

/// Apply `changes` to a live player; `None` when absent or soft-deleted
pub async fn update_player(
    pool: &SqlitePool,
    guid: &str,
    changes: &PlayerChanges,
) -> Result<Option<Player>> {
    if changes.is_empty() {
        return get_player(pool, guid).await;
    }

    let mut qb = update_query(guid, changes)?;
    let result = qb.build().execute(pool).await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_player(pool, guid).await
}

/// Soft-delete one live player; false when absent or already deleted
pub async fn soft_delete_player(pool: &SqlitePool, guid: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE players SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP \
         WHERE guid = ? AND deleted_at IS NULL",
    )
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
