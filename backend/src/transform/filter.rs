//! Team filtering of normalized tables.
//!
//! The team column is located once per table:
//!
//! 1. a `team` column: keep rows whose team is requested;
//! 2. `home_team` and `away_team` columns: keep rows where either side is
//!    requested (fixtures);
//! 3. neither: the table is returned untouched.
//!
//! Matching is exact and case-sensitive against the source's own spelling.

use std::collections::{BTreeSet, HashSet};

use crate::models::{NormalizedTable, Scalar};

/// Column holding the team on season tables.
pub const TEAM_COLUMN: &str = "team";
/// Columns holding both sides on fixture tables.
pub const HOME_TEAM_COLUMN: &str = "home_team";
pub const AWAY_TEAM_COLUMN: &str = "away_team";

/// How a table references teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamColumns {
    Single(usize),
    HomeAway { home: usize, away: usize },
}

/// Find where a table keeps its team names.
pub fn team_columns(table: &NormalizedTable) -> Option<TeamColumns> {
    if let Some(idx) = table.column_index(TEAM_COLUMN) {
        return Some(TeamColumns::Single(idx));
    }
    match (
        table.column_index(HOME_TEAM_COLUMN),
        table.column_index(AWAY_TEAM_COLUMN),
    ) {
        (Some(home), Some(away)) => Some(TeamColumns::HomeAway { home, away }),
        _ => None,
    }
}

fn is_wanted(cell: &Scalar, wanted: &HashSet<&str>) -> bool {
    cell.as_text().is_some_and(|team| wanted.contains(team))
}

/// Keep only rows that reference at least one of `teams`.
///
/// An empty `teams` list, or a table without team columns, is returned as is.
pub fn filter_by_team<S: AsRef<str>>(mut table: NormalizedTable, teams: &[S]) -> NormalizedTable {
    if teams.is_empty() {
        return table;
    }
    let wanted: HashSet<&str> = teams.iter().map(|t| t.as_ref()).collect();

    match team_columns(&table) {
        Some(TeamColumns::Single(idx)) => {
            table.retain_rows(|row| is_wanted(&row[idx], &wanted));
        }
        Some(TeamColumns::HomeAway { home, away }) => {
            table.retain_rows(|row| is_wanted(&row[home], &wanted) || is_wanted(&row[away], &wanted));
        }
        None => {}
    }
    table
}

/// Distinct team names in a table, sorted.
pub fn team_names(table: &NormalizedTable) -> Vec<String> {
    let mut names = BTreeSet::new();
    let columns = match team_columns(table) {
        Some(TeamColumns::Single(idx)) => vec![idx],
        Some(TeamColumns::HomeAway { home, away }) => vec![home, away],
        None => return Vec::new(),
    };
    for row in table.rows() {
        for &idx in &columns {
            if let Some(team) = row[idx].as_text() {
                names.insert(team.to_string());
            }
        }
    }
    names.into_iter().collect()
}
