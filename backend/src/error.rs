//! Error types for the statlab pipeline.
//!
//! - [`RequestError`] - The caller asked for something the catalog cannot serve
//! - [`SourceError`] - The statistics source failed to produce a table
//! - [`NormalizeError`] - A raw table had a shape the normalizer cannot flatten
//! - [`ExportError`] - CSV rendering failed
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ConfigError`] - Startup configuration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Conversion into [`PipelineError`] is automatic via `From`, so `?` works
//! across every stage of a request.

use thiserror::Error;

// =============================================================================
// Request Errors
// =============================================================================

/// Errors raised while validating a fetch request against the catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// None of the requested league keys exist in the catalog.
    #[error("No valid leagues provided. Choose from: {}", .available.join(", "))]
    NoValidLeagues { available: Vec<String> },

    /// Unknown data category.
    #[error("Unknown data type: {0}")]
    UnknownCategory(String),

    /// Stat subtype not offered for the category.
    #[error("Invalid stat type '{stat}' for {category} data. Choose from: {}", .available.join(", "))]
    InvalidStatType {
        category: String,
        stat: String,
        available: Vec<String>,
    },

    /// Blank season token.
    #[error("Season must not be empty")]
    EmptySeason,
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors from the statistics source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("Request to statistics source failed: {0}")]
    Request(String),

    /// The source answered with a non-success status.
    #[error("Statistics source returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The source answered with something that is not a table.
    #[error("Invalid table payload: {0}")]
    InvalidPayload(String),

    /// No recorded table exists for the requested operation.
    #[error("No recorded table for '{0}'")]
    MissingFixture(String),

    /// IO error while reading recorded tables.
    #[error("Source IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Errors raised when a raw table cannot be flattened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// A row carries a different number of values than there are columns.
    #[error("Row {row} has {found} values but the table declares {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Two columns share a name.
    #[error("Column name '{name}' appears more than once")]
    DuplicateColumn { name: String },

    /// A row carries a different number of index values than index levels.
    #[error("Row {row} has {found} index values but the table declares {expected} index levels")]
    IndexWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors raised while rendering a table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Buffer flush failure.
    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is what every [`crate::transform::pipeline::Pipeline`] operation
/// returns. Front ends turn it into a structured failure result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid request.
    #[error("{0}")]
    InvalidRequest(#[from] RequestError),

    /// The source failed; carries the upstream message.
    #[error("{0}")]
    Upstream(#[from] SourceError),

    /// The fetched table had an unexpected shape.
    #[error("Normalization failed: {0}")]
    Normalization(#[from] NormalizeError),

    /// Rendering failed.
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Stable machine-readable kind, used in failure results.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::Upstream(_) => "upstream_failure",
            PipelineError::Normalization(_) => "normalization_failure",
            PipelineError::Export(_) => "export_failure",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Configuration errors, reported at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a source URL nor a fixture directory was configured.
    #[error("No statistics source configured: set STATLAB_SOURCE_URL or STATLAB_FIXTURE_DIR")]
    NoSource,

    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },

    /// The source URL is not usable.
    #[error("Invalid source URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bind or serve failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for request validation.
pub type RequestResult<T> = Result<T, RequestError>;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
