//! Domain models shared by every stage of the pipeline.
//!
//! - [`LeagueKey`] - Human-facing league codes and their source identifiers
//! - [`Category`] - Which retrieval operation a request maps to
//! - [`FetchRequest`] / [`Query`] - Raw and validated request parameters
//! - [`RawTable`] - A table as the statistics source returns it
//! - [`NormalizedTable`] - A flat, JSON-safe table ready for export

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{NormalizeError, NormalizeResult, RequestError};

// =============================================================================
// League Keys
// =============================================================================

/// A supported domestic competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueKey {
    Epl,
    Laliga,
    Bundesliga,
    Seriea,
    Ligue1,
}

impl LeagueKey {
    /// Every league, in catalog order.
    pub const ALL: [LeagueKey; 5] = [
        LeagueKey::Epl,
        LeagueKey::Laliga,
        LeagueKey::Bundesliga,
        LeagueKey::Seriea,
        LeagueKey::Ligue1,
    ];

    /// The short key used in requests and filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueKey::Epl => "epl",
            LeagueKey::Laliga => "laliga",
            LeagueKey::Bundesliga => "bundesliga",
            LeagueKey::Seriea => "seriea",
            LeagueKey::Ligue1 => "ligue1",
        }
    }

    /// The identifier the statistics source understands.
    pub fn native_id(&self) -> &'static str {
        match self {
            LeagueKey::Epl => "ENG-Premier League",
            LeagueKey::Laliga => "ESP-La Liga",
            LeagueKey::Bundesliga => "GER-Bundesliga",
            LeagueKey::Seriea => "ITA-Serie A",
            LeagueKey::Ligue1 => "FRA-Ligue 1",
        }
    }
}

impl fmt::Display for LeagueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Categories
// =============================================================================

/// The kind of table requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Team,
    Player,
    Schedule,
    PlayerMatch,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Team,
        Category::Player,
        Category::Schedule,
        Category::PlayerMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Team => "team",
            Category::Player => "player",
            Category::Schedule => "schedule",
            Category::PlayerMatch => "player_match",
        }
    }

    /// Whether requests for this category carry a stat subtype.
    pub fn has_stat_types(&self) -> bool {
        !matches!(self, Category::Schedule)
    }

    /// Subtype used when the request does not name one.
    pub fn default_stat_type(&self) -> Option<&'static str> {
        match self {
            Category::Team | Category::Player => Some("standard"),
            Category::PlayerMatch => Some("summary"),
            Category::Schedule => None,
        }
    }

    /// Player tables are slow to scrape; progress reporting adds a checkpoint.
    pub fn is_slow(&self) -> bool {
        matches!(self, Category::Player | Category::PlayerMatch)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| RequestError::UnknownCategory(s.to_string()))
    }
}

// =============================================================================
// Requests
// =============================================================================

fn default_leagues() -> Vec<String> {
    vec!["epl".to_string()]
}

fn default_seasons() -> Vec<String> {
    vec!["2324".to_string()]
}

fn default_data_type() -> String {
    Category::Team.as_str().to_string()
}

/// Request parameters as they arrive from a front end.
///
/// Every field has a default so an empty JSON object is a valid request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    #[serde(default = "default_leagues")]
    pub leagues: Vec<String>,

    #[serde(default = "default_seasons")]
    pub seasons: Vec<String>,

    #[serde(default = "default_data_type", alias = "category")]
    pub data_type: String,

    /// Falls back to the category default when absent.
    #[serde(default)]
    pub stat_type: Option<String>,

    #[serde(default)]
    pub teams: Vec<String>,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            leagues: default_leagues(),
            seasons: default_seasons(),
            data_type: default_data_type(),
            stat_type: None,
            teams: Vec::new(),
        }
    }
}

/// A request that passed catalog validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub category: Category,
    /// Resolved leagues, duplicates and unknown keys removed.
    pub leagues: Vec<LeagueKey>,
    pub seasons: Vec<String>,
    /// Canonical subtype; `None` for the schedule.
    pub stat_type: Option<&'static str>,
    pub teams: Vec<String>,
}

impl Query {
    /// The part of the query the statistics source sees.
    pub fn scope(&self) -> Scope {
        Scope {
            leagues: self.leagues.iter().map(|l| l.native_id().to_string()).collect(),
            seasons: self.seasons.clone(),
        }
    }
}

/// Native league identifiers and seasons passed to the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub leagues: Vec<String>,
    pub seasons: Vec<String>,
}

// =============================================================================
// Raw Tables
// =============================================================================

/// A column label; hierarchical labels arrive as arrays of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLabel {
    Flat(String),
    Composite(Vec<String>),
}

impl From<&str> for ColumnLabel {
    fn from(s: &str) -> Self {
        ColumnLabel::Flat(s.to_string())
    }
}

impl From<Vec<&str>> for ColumnLabel {
    fn from(parts: Vec<&str>) -> Self {
        ColumnLabel::Composite(parts.into_iter().map(String::from).collect())
    }
}

/// Date and time values, tagged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temporal {
    Timestamp(chrono::NaiveDateTime),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Timestamp(ts) => write!(f, "{}", ts),
            Temporal::Date(d) => write!(f, "{}", d),
            Temporal::Time(t) => write!(f, "{}", t),
        }
    }
}

/// A cell as the source returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Temporal(Temporal),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Float(n)
    }
}

/// One row: identifying index values plus the data values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub index: Vec<RawValue>,
    pub values: Vec<RawValue>,
}

/// A table as the statistics source returns it.
///
/// `index_names` lists the levels that identify rows outside the ordinary
/// columns (e.g. league, season, team); each row carries one index value per
/// level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub index_names: Vec<String>,
    pub columns: Vec<ColumnLabel>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

// =============================================================================
// Normalized Tables
// =============================================================================

/// A JSON-safe cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Scalar> for Value {
    fn from(s: &Scalar) -> Self {
        match s {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(n) => Value::Number((*n).into()),
            Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::Text(s) => Value::String(s.clone()),
        }
    }
}

/// A flat table: unique column names, every row exactly as wide as the header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl NormalizedTable {
    /// Build a table, rejecting repeated column names and rows that do not
    /// match the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> NormalizeResult<Self> {
        let mut names = HashSet::with_capacity(columns.len());
        if let Some(name) = columns.iter().find(|c| !names.insert(c.as_str())) {
            return Err(NormalizeError::DuplicateColumn { name: name.clone() });
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
            .map(|(i, r)| (i, r.len()))
        {
            return Err(NormalizeError::RowWidth {
                row,
                expected: columns.len(),
                found,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Keep only the rows matching `keep`, preserving their order.
    pub(crate) fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Scalar]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// A row as an ordered JSON object keyed by column name.
    pub fn row_map(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .zip(row)
                .map(|(col, cell)| (col.clone(), Value::from(cell)))
                .collect(),
        )
    }

    /// The first `limit` rows as JSON objects.
    pub fn records(&self, limit: usize) -> Vec<Map<String, Value>> {
        (0..self.rows.len().min(limit))
            .filter_map(|i| self.row_map(i))
            .collect()
    }
}
