//! High-level pipeline API: request in, table out.
//!
//! Every front end (CLI, HTTP server) goes through [`Pipeline`], which runs
//! the same steps for each request:
//!
//! 1. Validate the request against the catalog
//! 2. Fetch the raw table (from the cache when possible)
//! 3. Normalize it
//! 4. Filter it by team
//! 5. Hand it to the caller, or encode it as a preview or CSV
//!
//! # Example
//!
//! ```rust,ignore
//! use statlab::{Config, FetchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Config::from_env()?.build_pipeline()?;
//!     let export = pipeline.export(&FetchRequest::default()).await?;
//!     std::fs::write(&export.filename, &export.bytes)?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::filter::{filter_by_team, team_names};
use super::normalize::normalize;
use crate::api::progress::{NoProgress, ProgressReporter, ProgressSink, Stage};
use crate::cache::{CacheKey, TableCache};
use crate::catalog;
use crate::error::{NormalizeResult, PipelineResult};
use crate::export::{export_filename, preview, to_csv, Preview, DEFAULT_PREVIEW_ROWS};
use crate::models::{Category, FetchRequest, NormalizedTable, Query, RawTable};
use crate::source::{read_category, StatsSource};

/// A normalized, filtered table plus how it was obtained.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub query: Query,
    pub table: NormalizedTable,
    /// Whether the raw table came from the cache.
    pub cached: bool,
}

/// Bounded preview of a request's table.
#[derive(Debug, Clone)]
pub struct PreviewOutput {
    pub preview: Preview,
    pub cached: bool,
}

/// CSV rendering of a request's table.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub row_count: usize,
}

/// Normalize a raw table and filter it by team.
pub fn normalize_and_filter<S: AsRef<str>>(
    raw: &RawTable,
    teams: &[S],
) -> NormalizeResult<NormalizedTable> {
    Ok(filter_by_team(normalize(raw)?, teams))
}

/// Download filename for a validated query.
pub fn query_filename(query: &Query) -> String {
    let leagues: Vec<&str> = query.leagues.iter().map(|l| l.as_str()).collect();
    let seasons: Vec<&str> = query.seasons.iter().map(String::as_str).collect();
    let teams: Vec<&str> = query.teams.iter().map(String::as_str).collect();
    export_filename(query.category, &leagues, &seasons, query.stat_type, &teams)
}

/// The request pipeline.
///
/// Owns the statistics source and, optionally, a table cache. Cheap to share
/// behind an `Arc`; requests never touch each other's state apart from the
/// cache.
pub struct Pipeline {
    source: Arc<dyn StatsSource>,
    cache: Option<TableCache>,
    preview_rows: usize,
}

impl Pipeline {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self {
            source,
            cache: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn with_cache(mut self, cache: TableCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Rows shown by [`Pipeline::preview`] when no limit is given.
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    pub fn cache(&self) -> Option<&TableCache> {
        self.cache.as_ref()
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Validate, fetch, normalize and filter.
    pub async fn run(&self, request: &FetchRequest) -> PipelineResult<PipelineOutput> {
        self.run_with_progress(request, &NoProgress).await
    }

    /// [`Pipeline::run`], reporting checkpoints to `sink`.
    pub async fn run_with_progress(
        &self,
        request: &FetchRequest,
        sink: &dyn ProgressSink,
    ) -> PipelineResult<PipelineOutput> {
        let request_id = Uuid::new_v4();
        let span = info_span!("pipeline", %request_id, data_type = %request.data_type);
        self.execute(request, sink).instrument(span).await
    }

    async fn execute(
        &self,
        request: &FetchRequest,
        sink: &dyn ProgressSink,
    ) -> PipelineResult<PipelineOutput> {
        let mut progress = ProgressReporter::new(sink);
        progress.report(Stage::Init, 5, "Initializing request...");

        let query = catalog::validate(request)?;
        debug!(?query, "Request validated");

        progress.report(
            Stage::Connect,
            15,
            format!("Connecting to {}...", self.source.name()),
        );
        progress.report(
            Stage::Fetch,
            30,
            format!("Fetching {} data...", query.category),
        );
        if query.category.is_slow() {
            progress.report(
                Stage::Fetch,
                40,
                "Fetching player stats (this may take a moment)...",
            );
        }

        let (raw, cached) = self.fetch(&query).await?;

        progress.report(Stage::Process, 70, "Processing data...");
        let table = normalize_and_filter(&raw, &query.teams)?;

        progress.report(Stage::Format, 85, "Formatting results...");
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            cached,
            "Table ready"
        );
        progress.report(Stage::Complete, 100, "Complete!");

        Ok(PipelineOutput {
            query,
            table,
            cached,
        })
    }

    async fn fetch(&self, query: &Query) -> PipelineResult<(Arc<RawTable>, bool)> {
        let key = CacheKey::new(query);
        if let Some(cache) = &self.cache {
            if let Some(table) = cache.get(&key).await {
                return Ok((table, true));
            }
            debug!(category = %query.category, "Cache miss");
        }

        let scope = query.scope();
        let raw = read_category(self.source.as_ref(), query.category, &scope, query.stat_type)
            .await
            .map_err(|e| {
                warn!(error = %e, "Statistics source failed");
                e
            })?;
        let raw = Arc::new(raw);

        if let Some(cache) = &self.cache {
            cache.insert(key, raw.clone()).await;
        }
        Ok((raw, false))
    }

    /// Preview the first `limit` rows (the configured default when `None`).
    pub async fn preview(
        &self,
        request: &FetchRequest,
        limit: Option<usize>,
    ) -> PipelineResult<PreviewOutput> {
        self.preview_with_progress(request, limit, &NoProgress).await
    }

    pub async fn preview_with_progress(
        &self,
        request: &FetchRequest,
        limit: Option<usize>,
        sink: &dyn ProgressSink,
    ) -> PipelineResult<PreviewOutput> {
        let output = self.run_with_progress(request, sink).await?;
        Ok(PreviewOutput {
            preview: preview(&output.table, limit.unwrap_or(self.preview_rows)),
            cached: output.cached,
        })
    }

    /// Full CSV export with its download filename.
    pub async fn export(&self, request: &FetchRequest) -> PipelineResult<CsvExport> {
        let output = self.run(request).await?;
        let bytes = to_csv(&output.table)?;
        Ok(CsvExport {
            filename: query_filename(&output.query),
            bytes,
            row_count: output.table.row_count(),
        })
    }

    /// Team names of a league season, from its standard team table.
    pub async fn teams(&self, league: &str, season: &str) -> PipelineResult<Vec<String>> {
        let request = FetchRequest {
            leagues: vec![league.to_string()],
            seasons: vec![season.to_string()],
            data_type: Category::Team.as_str().to_string(),
            stat_type: Category::Team.default_stat_type().map(String::from),
            teams: Vec::new(),
        };
        let output = self.run(&request).await?;
        Ok(team_names(&output.table))
    }
}
