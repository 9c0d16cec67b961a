//! Row normalization and validation
//!
//! One normalizer serves both entry points. [`FieldPolicy`] decides what
//! happens to a cell that does not parse:
//! - `Strict` (admin upload): record a [`ValidationError`] and keep scanning
//! - `Lenient` (feed sync): degrade the value to `None`, skip rows without
//!   id or name

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::csv::{parse_csv_line, ColumnMap, Field};

/// Samples of validation errors returned to the caller
pub const ERROR_SAMPLE_LIMIT: usize = 10;

/// What to do with a cell that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Collect an error; the whole batch is rejected afterwards
    Strict,
    /// Default the value and continue
    Lenient,
}

/// One normalized CSV data row
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
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
}

impl PlayerRecord {
    /// Record with only the required fields set
    pub fn new(sfbb_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            sfbb_id: sfbb_id.into(),
            player_name: player_name.into(),
            positions: Vec::new(),
            team: None,
            mlb_level: None,
            active: true,
            birthday: None,
            mlbam_id: None,
            fangraphs_id: None,
            fangraphs_minors_id: None,
            cbs_id: None,
            espn_id: None,
            yahoo_id: None,
            fantrax_id: None,
            retro_id: None,
            nfbc_id: None,
            bref_id: None,
        }
    }
}

/// A field-level problem in one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 1-based, header excluded
    pub row: usize,
    pub field: String,
    pub message: String,
}

/// Capped error sample plus the true error count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
}

/// Accumulates validation errors without aborting the scan
#[derive(Debug)]
pub struct ErrorCollector {
    errors: Vec<ValidationError>,
    count: usize,
    limit: usize,
}

impl ErrorCollector {
    pub fn new(limit: usize) -> Self {
        Self {
            errors: Vec::new(),
            count: 0,
            limit,
        }
    }

    pub fn add(&mut self, row: usize, field: &str, message: &str) {
        self.count += 1;
        if self.errors.len() < self.limit {
            self.errors.push(ValidationError {
                row,
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_report(self) -> ValidationReport {
        ValidationReport {
            error_count: self.count,
            errors: self.errors,
        }
    }
}

/// Split a raw position token on whitespace, comma, slash or tab
pub fn parse_positions(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == '/')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decimal integer with an optional leading `-`
pub fn parse_int(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Calendar date in one of the formats SFBB and spreadsheet exports use
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Anything but an explicit `N` counts as active, including a missing
/// column
pub fn parse_active(raw: &str) -> bool {
    raw.to_uppercase() != "N"
}

fn optional_text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Normalizes data rows against a resolved header
pub struct RowNormalizer<'a> {
    map: &'a ColumnMap,
    labels: &'a crate::csv::ColumnSpec,
    policy: FieldPolicy,
    errors: ErrorCollector,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(map: &'a ColumnMap, labels: &'a crate::csv::ColumnSpec, policy: FieldPolicy) -> Self {
        Self {
            map,
            labels,
            policy,
            errors: ErrorCollector::new(ERROR_SAMPLE_LIMIT),
        }
    }

    fn label(&self, field: Field) -> &'static str {
        self.labels.label(field).unwrap_or("")
    }

    fn reject(&mut self, row: usize, field: Field, message: &str) {
        if self.policy == FieldPolicy::Strict {
            let label = self.label(field);
            self.errors.add(row, label, message);
        }
    }

    fn int(&mut self, row: usize, cells: &[String], field: Field) -> Option<i64> {
        let raw = self.map.cell(cells, field);
        if raw.is_empty() {
            return None;
        }
        let value = parse_int(raw);
        if value.is_none() {
            self.reject(row, field, "Must be an integer");
        }
        value
    }

    fn date(&mut self, row: usize, cells: &[String], field: Field) -> Option<NaiveDate> {
        let raw = self.map.cell(cells, field);
        if raw.is_empty() {
            return None;
        }
        let value = parse_date(raw);
        if value.is_none() {
            self.reject(row, field, "Invalid date");
        }
        value
    }

    /// Normalize one data row. `row` is 1-based, header excluded.
    ///
    /// Returns `None` when the row is skipped (lenient) or invalid (strict).
    pub fn normalize(&mut self, row: usize, line: &str) -> Option<PlayerRecord> {
        let cells = parse_csv_line(line);
        let errors_before = self.errors.count();

        let sfbb_id = self.map.cell(&cells, Field::ExternalId).to_string();
        let player_name = self.map.cell(&cells, Field::DisplayName).to_string();

        if self.policy == FieldPolicy::Lenient && (sfbb_id.is_empty() || player_name.is_empty()) {
            return None;
        }
        if sfbb_id.is_empty() {
            self.reject(row, Field::ExternalId, "Required");
        }
        if player_name.is_empty() {
            self.reject(row, Field::DisplayName, "Required");
        }

        // Errors are reported in this order
        let fangraphs_id = self.int(row, &cells, Field::FangraphsId);
        let mlbam_id = self.int(row, &cells, Field::MlbamId);
        let birthday = self.date(row, &cells, Field::Birthday);

        let record = PlayerRecord {
            sfbb_id,
            player_name,
            positions: parse_positions(self.map.cell(&cells, Field::Positions)),
            team: optional_text(self.map.cell(&cells, Field::Team)),
            mlb_level: optional_text(self.map.cell(&cells, Field::MlbLevel)),
            active: parse_active(self.map.cell(&cells, Field::Active)),
            birthday,
            mlbam_id,
            fangraphs_id,
            fangraphs_minors_id: optional_text(self.map.cell(&cells, Field::FangraphsMinorsId)),
            cbs_id: self.int(row, &cells, Field::CbsId),
            espn_id: self.int(row, &cells, Field::EspnId),
            yahoo_id: self.int(row, &cells, Field::YahooId),
            fantrax_id: optional_text(self.map.cell(&cells, Field::FantraxId)),
            retro_id: optional_text(self.map.cell(&cells, Field::RetroId)),
            nfbc_id: self.int(row, &cells, Field::NfbcId),
            bref_id: optional_text(self.map.cell(&cells, Field::BrefId)),
        };

        (self.errors.count() == errors_before).then_some(record)
    }

    /// Normalize every data row (header excluded)
    ///
    /// Strict policy: any error rejects the batch with the report.
    pub fn normalize_all(mut self, data_lines: &[&str]) -> Result<Vec<PlayerRecord>, ValidationReport> {
        let mut records = Vec::with_capacity(data_lines.len());
        for (i, line) in data_lines.iter().enumerate() {
            if let Some(record) = self.normalize(i + 1, line) {
                records.push(record);
            }
        }

        if self.errors.count() > 0 {
            return Err(self.errors.into_report());
        }
        Ok(records)
    }
}
