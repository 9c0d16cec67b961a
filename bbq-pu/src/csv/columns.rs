//! Header resolution for the SFBB player ID map
//!
//! A [`ColumnSpec`] names the header label expected for each logical
//! field. Resolution happens once per batch, against the header row.

use std::collections::HashMap;
use std::fmt;

/// Logical player fields that can be read from a CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ExternalId,
    DisplayName,
    Birthday,
    Positions,
    Team,
    MlbLevel,
    Active,
    MlbamId,
    FangraphsId,
    FangraphsMinorsId,
    CbsId,
    EspnId,
    YahooId,
    FantraxId,
    RetroId,
    NfbcId,
    BrefId,
}

impl Field {
    /// Fields every batch must carry
    pub const REQUIRED: [Field; 2] = [Field::ExternalId, Field::DisplayName];

    /// Backing column in the `players` table
    pub fn db_column(self) -> &'static str {
        match self {
            Field::ExternalId => "sfbb_id",
            Field::DisplayName => "player_name",
            Field::Birthday => "birthday",
            Field::Positions => "positions",
            Field::Team => "team",
            Field::MlbLevel => "mlb_level",
            Field::Active => "active",
            Field::MlbamId => "mlbam_id",
            Field::FangraphsId => "fangraphs_id",
            Field::FangraphsMinorsId => "fangraphs_minors_id",
            Field::CbsId => "cbs_id",
            Field::EspnId => "espn_id",
            Field::YahooId => "yahoo_id",
            Field::FantraxId => "fantrax_id",
            Field::RetroId => "retro_id",
            Field::NfbcId => "nfbc_id",
            Field::BrefId => "bref_id",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

/// Expected header labels for one entry point
#[derive(Debug)]
pub struct ColumnSpec {
    pub columns: &'static [(Field, &'static str)],
    /// How many found headers to echo when required columns are missing
    pub header_echo_limit: usize,
}

impl ColumnSpec {
    pub fn label(&self, field: Field) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, label)| *label)
    }

    /// Fields this spec manages, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.iter().map(|(field, _)| *field)
    }
}

/// Columns accepted by the admin CSV upload
pub const UPLOAD_COLUMNS: ColumnSpec = ColumnSpec {
    columns: &[
        (Field::ExternalId, "IDPLAYER"),
        (Field::DisplayName, "PLAYERNAME"),
        (Field::FangraphsId, "IDFANGRAPHS"),
        (Field::FangraphsMinorsId, "FANGRAPHSMINORSID"),
        (Field::MlbamId, "MLBID"),
        (Field::Birthday, "BIRTHDATE"),
        (Field::Positions, "POS"),
    ],
    header_echo_limit: 10,
};

/// Columns read from the SFBB feed. Update the labels here if SFBB
/// renames a column.
pub const FEED_COLUMNS: ColumnSpec = ColumnSpec {
    columns: &[
        (Field::ExternalId, "IDPLAYER"),
        (Field::DisplayName, "PLAYERNAME"),
        (Field::Birthday, "BIRTHDATE"),
        (Field::Positions, "POS"),
        (Field::Team, "TEAM"),
        (Field::MlbLevel, "LG"),
        (Field::Active, "ACTIVE"),
        (Field::MlbamId, "MLBID"),
        (Field::FangraphsId, "IDFANGRAPHS"),
        (Field::FangraphsMinorsId, "FANGRAPHSMINORSID"),
        (Field::CbsId, "CBSID"),
        (Field::EspnId, "ESPNID"),
        (Field::YahooId, "YAHOOID"),
        (Field::FantraxId, "FANTRAXID"),
        (Field::RetroId, "RETROID"),
        (Field::NfbcId, "NFBCID"),
        (Field::BrefId, "BREFID"),
    ],
    header_echo_limit: 15,
};

/// Required labels absent from a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns {
    /// Expected labels of every required field
    pub expected: Vec<&'static str>,
    /// Expected labels that were not found
    pub missing: Vec<&'static str>,
    /// Prefix of the headers actually present
    pub found: Vec<String>,
}

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing required columns: {}. Headers found: {}",
            self.missing.join(", "),
            self.found.join(", ")
        )
    }
}

/// Logical field -> column index for one header row
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Resolve `spec` against a tokenized header row
    ///
    /// Labels match exactly after trimming; a UTF-8 BOM on the first
    /// header is ignored. The first matching column wins.
    pub fn resolve(headers: &[String], spec: &ColumnSpec) -> Result<Self, MissingColumns> {
        let normalized: Vec<&str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 {
                    h.trim_start_matches('\u{feff}')
                } else {
                    h.as_str()
                };
                h.trim()
            })
            .collect();

        let indices: HashMap<Field, usize> = spec
            .columns
            .iter()
            .filter_map(|(field, label)| {
                normalized
                    .iter()
                    .position(|h| h == label)
                    .map(|idx| (*field, idx))
            })
            .collect();

        let required: Vec<(Field, &'static str)> = spec
            .columns
            .iter()
            .filter(|(field, _)| field.is_required())
            .copied()
            .collect();

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(field, _)| !indices.contains_key(field))
            .map(|(_, label)| *label)
            .collect();

        if !missing.is_empty() {
            return Err(MissingColumns {
                expected: required.iter().map(|(_, label)| *label).collect(),
                missing,
                found: normalized
                    .iter()
                    .take(spec.header_echo_limit)
                    .map(|h| h.to_string())
                    .collect(),
            });
        }

        Ok(Self { indices })
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    /// Trimmed cell for `field`; empty when the column is unresolved or
    /// the row is short
    pub fn cell<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.index(field)
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }
}
