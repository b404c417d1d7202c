//! # Statlab - football statistics tables as previews and CSV
//!
//! Statlab sits between a football statistics source (a scraper wrapped as a
//! table service, or recorded tables) and its users: it validates what is
//! asked for, flattens the hierarchical tables the source returns, filters
//! them by team and renders them as JSON previews or CSV downloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Request   │────▶│   Catalog   │────▶│   Source    │────▶│  Normalize  │
//! │ (league..)  │     │ (validate)  │     │ (+ cache)   │     │  + filter   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!                                                          ┌──────────────────┐
//!                                                          │  Preview / CSV   │
//!                                                          └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statlab::{Config, FetchRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Config::from_env().unwrap().build_pipeline().unwrap();
//!     let output = pipeline.preview(&FetchRequest::default(), None).await.unwrap();
//!     println!("{} rows", output.preview.row_count);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Requests, raw tables and normalized tables
//! - [`catalog`] - Leagues, seasons, stat subtypes and request validation
//! - [`source`] - Statistics source interface and implementations
//! - [`cache`] - Table cache
//! - [`transform`] - Normalization, team filter and pipeline
//! - [`export`] - Preview and CSV rendering
//! - [`config`] - Environment configuration
//! - [`logging`] - Tracing setup
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Catalog
pub mod catalog;

// Sources
pub mod source;

// Caching
pub mod cache;

// Transformation
pub mod transform;

// Rendering
pub mod export;

// Setup
pub mod config;
pub mod logging;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ExportError, NormalizeError, PipelineError, PipelineResult, RequestError,
    ServerError, SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Category, ColumnLabel, FetchRequest, LeagueKey, NormalizedTable, Query, RawRow, RawTable,
    RawValue, Scalar, Scope, Temporal,
};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use catalog::{resolve, resolve_native, validate};

// =============================================================================
// Re-exports - Sources
// =============================================================================

pub use source::{FixtureSource, HttpSource, MemorySource, Operation, StatsSource};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{CacheKey, TableCache};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    filter_by_team, normalize, normalize_and_filter, team_names, CsvExport, Pipeline,
    PipelineOutput, PreviewOutput,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_filename, preview, to_csv, Preview, DEFAULT_PREVIEW_ROWS};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{Config, SourceConfig};

// Server
pub mod server {
    pub use crate::api::server::{app, start_server};
}
