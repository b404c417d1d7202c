//! In-memory source.
//!
//! Serves tables registered up front, keyed by operation and (optionally) stat
//! subtype. Counts calls so callers can see whether a cache was hit.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Operation, StatsSource};
use crate::error::{SourceError, SourceResult};
use crate::models::{RawTable, Scope};

#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<(Operation, Option<String>), RawTable>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Register a table for any subtype of `operation`.
    pub fn with_table(mut self, operation: Operation, table: RawTable) -> Self {
        self.tables.insert((operation, None), table);
        self
    }

    /// Register a table for one subtype of `operation`.
    pub fn with_stat_table(mut self, operation: Operation, stat_type: &str, table: RawTable) -> Self {
        self.tables
            .insert((operation, Some(stat_type.to_string())), table);
        self
    }

    /// Number of retrieval calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, operation: Operation, stat_type: Option<&str>) -> SourceResult<RawTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(SourceError::Request(message.clone()));
        }
        stat_type
            .and_then(|s| self.tables.get(&(operation, Some(s.to_string()))))
            .or_else(|| self.tables.get(&(operation, None)))
            .cloned()
            .ok_or_else(|| SourceError::MissingFixture(operation.to_string()))
    }
}

impl StatsSource for MemorySource {
    fn name(&self) -> String {
        "in-memory tables".to_string()
    }

    fn read_team_season_stats<'a>(
        &'a self,
        _scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        let result = self.lookup(Operation::TeamSeasonStats, Some(stat_type));
        async move { result }.boxed()
    }

    fn read_player_season_stats<'a>(
        &'a self,
        _scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        let result = self.lookup(Operation::PlayerSeasonStats, Some(stat_type));
        async move { result }.boxed()
    }

    fn read_schedule<'a>(&'a self, _scope: &'a Scope) -> BoxFuture<'a, SourceResult<RawTable>> {
        let result = self.lookup(Operation::Schedule, None);
        async move { result }.boxed()
    }

    fn read_player_match_stats<'a>(
        &'a self,
        _scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        let result = self.lookup(Operation::PlayerMatchStats, Some(stat_type));
        async move { result }.boxed()
    }
}
