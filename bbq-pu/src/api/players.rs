//! Player store API backing the admin players table
//!
//! Only live (not soft-deleted) players are visible. Admins can also add a
//! player by hand and edit the identity fields the upload manages.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bbq_common::api::Caller;
use bbq_common::db::Player;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::db::players::{self, PlayerChanges};
use crate::error::{ApiError, ApiResult};
use crate::normalize::{parse_date, PlayerRecord};
use crate::AppState;

const MAX_PAGE_SIZE: i64 = 500;

/// Query parameters for the player list
#[derive(Debug, Deserialize)]
pub struct PlayerListQuery {
    /// Case-insensitive name substring
    pub search: Option<String>,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Rows per page
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    50
}

/// One page of players
#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    pub data: Vec<Player>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// GET /api/players
pub async fn list_players(
    State(state): State<AppState>,
    Query(query): Query<PlayerListQuery>,
) -> ApiResult<Json<PlayerListResponse>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let (data, total) =
        players::list_players(&state.db, query.search.as_deref(), limit, offset).await?;

    Ok(Json(PlayerListResponse {
        data,
        total,
        page,
        limit,
    }))
}

/// GET /api/players/:guid
pub async fn get_player(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> ApiResult<Json<Player>> {
    players::get_player(&state.db, &guid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))
}

/// DELETE /api/players/:guid
///
/// Soft delete; the next import or sync that includes the player
/// revives it.
pub async fn delete_player(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(guid): Path<String>,
) -> ApiResult<StatusCode> {
    if !players::soft_delete_player(&state.db, &guid).await? {
        return Err(ApiError::NotFound("Not found".to_string()));
    }

    info!(
        guid = %guid,
        user = caller.user_id.as_deref().unwrap_or("-"),
        "Player soft-deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Body of POST /api/players
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    /// SFBB player id
    #[serde(alias = "sfbbId")]
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub fangraphs_id: Option<i64>,
    pub fangraphs_minors_id: Option<String>,
    pub mlbam_id: Option<i64>,
    pub birthday: Option<String>,
    #[serde(default)]
    pub positions: Vec<String>,
}

/// Body of PATCH /api/players/:guid. Absent keys are left alone; `null`
/// clears a nullable column.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPatch {
    pub player_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub fangraphs_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fangraphs_minors_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub mlbam_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birthday: Option<Option<String>>,
    pub positions: Option<Vec<String>>,
}

/// Present-but-null becomes `Some(None)`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Empty or missing birthday means none
fn birthday(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|b| !b.is_empty()) {
        None => Ok(None),
        Some(b) => parse_date(b)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest("Invalid date".to_string())),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewPlayer {
    fn into_record(self) -> ApiResult<PlayerRecord> {
        let (Some(sfbb_id), Some(player_name)) =
            (non_blank(self.player_id), non_blank(self.player_name))
        else {
            return Err(ApiError::BadRequest(
                "playerId and playerName are required".to_string(),
            ));
        };

        let mut record = PlayerRecord::new(sfbb_id, player_name);
        record.birthday = birthday(self.birthday.as_deref())?;
        record.fangraphs_id = self.fangraphs_id;
        record.fangraphs_minors_id = non_blank(self.fangraphs_minors_id);
        record.mlbam_id = self.mlbam_id;
        record.positions = self.positions;
        Ok(record)
    }
}

impl PlayerPatch {
    fn into_changes(self) -> ApiResult<PlayerChanges> {
        let player_name = match self.player_name {
            Some(name) => Some(
                non_blank(Some(name))
                    .ok_or_else(|| ApiError::BadRequest("playerName cannot be empty".to_string()))?,
            ),
            None => None,
        };

        let birthday = match self.birthday {
            Some(raw) => Some(birthday(raw.as_deref())?),
            None => None,
        };

        Ok(PlayerChanges {
            player_name,
            positions: self.positions,
            birthday,
            mlbam_id: self.mlbam_id,
            fangraphs_id: self.fangraphs_id,
            fangraphs_minors_id: self.fangraphs_minors_id.map(non_blank),
        })
    }
}

/// POST /api/players
pub async fn create_player(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<NewPlayer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Player>)> {
    let record = json_body(body)?.into_record()?;

    let player = players::insert_player(&state.db, &record)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!("Player {} already exists", record.sfbb_id))
        })?;

    info!(
        guid = %player.guid,
        sfbb_id = %player.sfbb_id,
        user = caller.user_id.as_deref().unwrap_or("-"),
        "Player created"
    );
    Ok((StatusCode::CREATED, Json(player)))
}

/// PATCH /api/players/:guid
pub async fn update_player(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(guid): Path<String>,
    body: Result<Json<PlayerPatch>, JsonRejection>,
) -> ApiResult<Json<Player>> {
    let changes = json_body(body)?.into_changes()?;

    let player = players::update_player(&state.db, &guid, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    info!(
        guid = %guid,
        user = caller.user_id.as_deref().unwrap_or("-"),
        "Player updated"
    );
    Ok(Json(player))
}
