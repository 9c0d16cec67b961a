//! Database models

use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

/// Column list matching [`Player::from_row`]
pub const PLAYER_COLUMNS: &str = "guid, sfbb_id, player_name, positions, team, mlb_level, active, \
     birthday, mlbam_id, fangraphs_id, fangraphs_minors_id, cbs_id, espn_id, yahoo_id, \
     fantrax_id, retro_id, nfbc_id, bref_id, created_at, updated_at, deleted_at";

/// Persisted player, keyed by the SFBB player id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub guid: String,
    pub sfbb_id: String,
    pub player_name: String,
    pub positions: Vec<String>,
    pub team: Option<String>,
    pub mlb_level: Option<String>,
    pub active: bool,
    pub birthday: Option<NaiveDate>,
    pub mlbam_id: Option<i64>,
    pub fangraphs_id: Option<i64>,
    pub fangraphs_minors_id: Option<String>,
    pub cbs_id: Option<i64>,
    pub espn_id: Option<i64>,
    pub yahoo_id: Option<i64>,
    pub fantrax_id: Option<String>,
    pub retro_id: Option<String>,
    pub nfbc_id: Option<i64>,
    pub bref_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl Player {
    /// Decode a row selected with [`PLAYER_COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let positions: String = row.try_get("positions")?;
        let birthday: Option<String> = row.try_get("birthday")?;

        Ok(Self {
            guid: row.try_get("guid")?,
            sfbb_id: row.try_get("sfbb_id")?,
            player_name: row.try_get("player_name")?,
            positions: serde_json::from_str(&positions)?,
            team: row.try_get("team")?,
            mlb_level: row.try_get("mlb_level")?,
            active: row.try_get("active")?,
            birthday: birthday.and_then(|b| NaiveDate::parse_from_str(&b, "%Y-%m-%d").ok()),
            mlbam_id: row.try_get("mlbam_id")?,
            fangraphs_id: row.try_get("fangraphs_id")?,
            fangraphs_minors_id: row.try_get("fangraphs_minors_id")?,
            cbs_id: row.try_get("cbs_id")?,
            espn_id: row.try_get("espn_id")?,
            yahoo_id: row.try_get("yahoo_id")?,
            fantrax_id: row.try_get("fantrax_id")?,
            retro_id: row.try_get("retro_id")?,
            nfbc_id: row.try_get("nfbc_id")?,
            bref_id: row.try_get("bref_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
