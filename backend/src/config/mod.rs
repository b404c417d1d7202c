//! Process configuration.
//!
//! Read once at startup from the environment (after loading `.env`):
//!
//! | variable | default |
//! |---|---|
//! | `STATLAB_SOURCE_URL` | - |
//! | `STATLAB_FIXTURE_DIR` | - |
//! | `STATLAB_SOURCE_TIMEOUT_SECS` | 120 |
//! | `STATLAB_CACHE_TTL_SECS` (0 disables) | 3600 |
//! | `STATLAB_CACHE_CAPACITY` | 64 |
//! | `STATLAB_PREVIEW_ROWS` | 20 |
//! | `STATLAB_REQUEST_TIMEOUT_SECS` | 300 |
//! | `PORT` | 5050 |
//!
//! The source URL wins when both a URL and a fixture directory are set.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{TableCache, DEFAULT_CAPACITY};
use crate::error::ConfigError;
use crate::export::DEFAULT_PREVIEW_ROWS;
use crate::source::{FixtureSource, HttpSource, StatsSource};
use crate::transform::pipeline::Pipeline;

pub const SOURCE_URL_VAR: &str = "STATLAB_SOURCE_URL";
pub const FIXTURE_DIR_VAR: &str = "STATLAB_FIXTURE_DIR";
const SOURCE_TIMEOUT_VAR: &str = "STATLAB_SOURCE_TIMEOUT_SECS";
const CACHE_TTL_VAR: &str = "STATLAB_CACHE_TTL_SECS";
const CACHE_CAPACITY_VAR: &str = "STATLAB_CACHE_CAPACITY";
const PREVIEW_ROWS_VAR: &str = "STATLAB_PREVIEW_ROWS";
const REQUEST_TIMEOUT_VAR: &str = "STATLAB_REQUEST_TIMEOUT_SECS";
const PORT_VAR: &str = "PORT";

const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_PORT: u16 = 5050;

/// Where tables come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Http { base_url: String },
    Fixtures { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: Option<SourceConfig>,
    pub source_timeout: Duration,
    /// Zero disables the table cache.
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub preview_rows: usize,
    pub request_timeout: Duration,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CAPACITY,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: v,
        }),
    }
}

impl Config {
    /// Load `.env` (if present) and read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let source = match (non_empty(SOURCE_URL_VAR), non_empty(FIXTURE_DIR_VAR)) {
            (Some(base_url), _) => Some(SourceConfig::Http { base_url }),
            (None, Some(dir)) => Some(SourceConfig::Fixtures { dir: dir.into() }),
            (None, None) => None,
        };

        Ok(Self {
            source,
            source_timeout: Duration::from_secs(parse_var(
                &lookup,
                SOURCE_TIMEOUT_VAR,
                DEFAULT_SOURCE_TIMEOUT_SECS,
            )?),
            cache_ttl: Duration::from_secs(parse_var(&lookup, CACHE_TTL_VAR, DEFAULT_CACHE_TTL_SECS)?),
            cache_capacity: parse_var(&lookup, CACHE_CAPACITY_VAR, DEFAULT_CAPACITY)?,
            preview_rows: parse_var(&lookup, PREVIEW_ROWS_VAR, DEFAULT_PREVIEW_ROWS)?,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                REQUEST_TIMEOUT_VAR,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            port: parse_var(&lookup, PORT_VAR, DEFAULT_PORT)?,
        })
    }

    /// Override the source with an HTTP table service.
    pub fn with_source_url(mut self, base_url: impl Into<String>) -> Self {
        self.source = Some(SourceConfig::Http {
            base_url: base_url.into(),
        });
        self
    }

    /// Override the source with a fixture directory.
    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source = Some(SourceConfig::Fixtures { dir: dir.into() });
        self
    }

    /// Construct the one statistics source for this process.
    pub fn build_source(&self) -> Result<Arc<dyn StatsSource>, ConfigError> {
        let source: Arc<dyn StatsSource> = match &self.source {
            Some(SourceConfig::Http { base_url }) => {
                Arc::new(HttpSource::new(base_url, self.source_timeout)?)
            }
            Some(SourceConfig::Fixtures { dir }) => Arc::new(FixtureSource::new(dir.clone())),
            None => return Err(ConfigError::NoSource),
        };
        info!(source = %source.name(), "Statistics source configured");
        Ok(source)
    }

    /// The table cache, unless disabled.
    pub fn build_cache(&self) -> Option<TableCache> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        Some(TableCache::new(self.cache_capacity, self.cache_ttl))
    }

    /// Source, cache and preview size wired into a pipeline.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        let mut pipeline = Pipeline::new(self.build_source()?).with_preview_rows(self.preview_rows);
        if let Some(cache) = self.build_cache() {
            pipeline = pipeline.with_cache(cache);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.port, 5050);
        assert_eq!(cfg.preview_rows, 20);
        assert!(matches!(cfg.build_source().err(), Some(ConfigError::NoSource)));
    }

    #[test]
    fn test_url_wins_over_fixtures() {
        let cfg = config(&[
            (SOURCE_URL_VAR, "http://localhost:8000"),
            (FIXTURE_DIR_VAR, "fixtures"),
        ])
        .unwrap();
        assert_eq!(
            cfg.source,
            Some(SourceConfig::Http {
                base_url: "http://localhost:8000".into()
            })
        );
    }

    #[test]
    fn test_blank_url_falls_through() {
        let cfg = config(&[(SOURCE_URL_VAR, "  "), (FIXTURE_DIR_VAR, "fixtures")]).unwrap();
        assert_eq!(
            cfg.source,
            Some(SourceConfig::Fixtures {
                dir: "fixtures".into()
            })
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = config(&[(CACHE_TTL_VAR, "soon")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { var, value } => {
                assert_eq!(var, CACHE_TTL_VAR);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cfg = config(&[(CACHE_TTL_VAR, "0")]).unwrap();
        assert!(cfg.build_cache().is_none());
        assert!(Config::default().build_cache().is_some());
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::default()
            .with_fixture_dir("recorded")
            .with_source_url("http://tables:9000");
        assert!(matches!(cfg.source, Some(SourceConfig::Http { .. })));
        assert!(cfg.build_source().is_ok());
    }

    #[test]
    fn test_invalid_url_reported_at_build() {
        let cfg = Config::default().with_source_url("::nope::");
        assert!(matches!(
            cfg.build_source().err(),
            Some(ConfigError::InvalidUrl { .. })
        ));
    }
}
