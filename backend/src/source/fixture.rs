//! Recorded tables on disk.
//!
//! A fixture directory holds one RawTable JSON file per operation, optionally
//! per stat subtype:
//!
//! ```text
//! fixtures/
//! ├── team_season_stats_shooting.json
//! ├── team_season_stats.json          # any subtype
//! ├── schedule.json
//! └── player_match_stats_summary.json
//! ```
//!
//! When a recorded table carries `league` / `season` index levels, rows
//! outside the requested scope are dropped.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Operation, StatsSource};
use crate::error::{SourceError, SourceResult};
use crate::models::{RawRow, RawTable, RawValue, Scope};

const LEAGUE_LEVEL: &str = "league";
const SEASON_LEVEL: &str = "season";

/// Source answering from a directory of recorded tables.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(operation: Operation, stat_type: Option<&str>) -> Vec<String> {
        let mut names = Vec::with_capacity(2);
        if let Some(stat) = stat_type {
            names.push(format!("{}_{}.json", operation, stat));
        }
        names.push(format!("{}.json", operation));
        names
    }

    async fn load(
        &self,
        operation: Operation,
        scope: &Scope,
        stat_type: Option<&str>,
    ) -> SourceResult<RawTable> {
        let candidates = Self::candidates(operation, stat_type);
        for name in &candidates {
            let path = self.dir.join(name);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            debug!(path = %path.display(), "Loaded recorded table");

            let table: RawTable = serde_json::from_str(&content).map_err(|e| {
                SourceError::InvalidPayload(format!("{}: {}", path.display(), e))
            })?;
            return Ok(restrict_to_scope(table, scope));
        }

        Err(SourceError::MissingFixture(candidates.join(" or ")))
    }
}

fn level_matches(row: &RawRow, level: Option<usize>, wanted: &[String]) -> bool {
    let Some(level) = level else {
        return true;
    };
    match row.index.get(level) {
        Some(RawValue::Text(s)) => wanted.iter().any(|w| w == s),
        Some(RawValue::Int(n)) => wanted.iter().any(|w| *w == n.to_string()),
        _ => false,
    }
}

/// Drop rows whose league or season index level falls outside `scope`.
fn restrict_to_scope(mut table: RawTable, scope: &Scope) -> RawTable {
    let league = table.index_names.iter().position(|n| n == LEAGUE_LEVEL);
    let season = table.index_names.iter().position(|n| n == SEASON_LEVEL);
    if league.is_none() && season.is_none() {
        return table;
    }
    table.rows.retain(|row| {
        level_matches(row, league, &scope.leagues) && level_matches(row, season, &scope.seasons)
    });
    table
}

impl StatsSource for FixtureSource {
    fn name(&self) -> String {
        format!("fixtures in {}", self.dir.display())
    }

    fn read_team_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.load(Operation::TeamSeasonStats, scope, Some(stat_type))
            .boxed()
    }

    fn read_player_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.load(Operation::PlayerSeasonStats, scope, Some(stat_type))
            .boxed()
    }

    fn read_schedule<'a>(&'a self, scope: &'a Scope) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.load(Operation::Schedule, scope, None).boxed()
    }

    fn read_player_match_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.load(Operation::PlayerMatchStats, scope, Some(stat_type))
            .boxed()
    }
}
