//! Statistics source interface.
//!
//! The scraping itself happens elsewhere; this crate only needs something that
//! answers the four table requests below with a [`RawTable`]. Implementations:
//!
//! - [`HttpSource`] - a table service speaking the RawTable JSON format
//! - [`FixtureSource`] - recorded tables on disk
//! - [`MemorySource`] - tables held in memory
//!
//! Exactly one source is built per process (see [`crate::config::Config`]).

pub mod fixture;
pub mod http;
pub mod memory;

use futures::future::BoxFuture;
use std::fmt;

use crate::error::SourceResult;
use crate::models::{Category, RawTable, Scope};

pub use fixture::FixtureSource;
pub use http::HttpSource;
pub use memory::MemorySource;

/// The four retrieval operations a source offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TeamSeasonStats,
    PlayerSeasonStats,
    Schedule,
    PlayerMatchStats,
}

impl Operation {
    /// Path segment / file stem for the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TeamSeasonStats => "team_season_stats",
            Operation::PlayerSeasonStats => "player_season_stats",
            Operation::Schedule => "schedule",
            Operation::PlayerMatchStats => "player_match_stats",
        }
    }
}

impl From<Category> for Operation {
    fn from(category: Category) -> Self {
        match category {
            Category::Team => Operation::TeamSeasonStats,
            Category::Player => Operation::PlayerSeasonStats,
            Category::Schedule => Operation::Schedule,
            Category::PlayerMatch => Operation::PlayerMatchStats,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can produce raw statistics tables.
pub trait StatsSource: Send + Sync {
    /// Short description for logs and health checks.
    fn name(&self) -> String;

    /// Season-level team statistics of one subtype.
    fn read_team_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>>;

    /// Season-level player statistics of one subtype.
    fn read_player_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>>;

    /// Fixtures and results.
    fn read_schedule<'a>(&'a self, scope: &'a Scope) -> BoxFuture<'a, SourceResult<RawTable>>;

    /// Per-match player statistics of one subtype.
    fn read_player_match_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>>;
}

/// Call the operation matching `category`.
pub async fn read_category(
    source: &dyn StatsSource,
    category: Category,
    scope: &Scope,
    stat_type: Option<&str>,
) -> SourceResult<RawTable> {
    let stat = stat_type
        .or_else(|| category.default_stat_type())
        .unwrap_or_default();
    match category {
        Category::Team => source.read_team_season_stats(scope, stat).await,
        Category::Player => source.read_player_season_stats(scope, stat).await,
        Category::Schedule => source.read_schedule(scope).await,
        Category::PlayerMatch => source.read_player_match_stats(scope, stat).await,
    }
}
