//! HTTP table service client.
//!
//! Talks to a service that wraps the scraping library and answers
//! `GET {base}/{operation}?leagues=..&seasons=..&stat_type=..` with a
//! RawTable JSON document. Error bodies of the form `{"error": "..."}` are
//! surfaced verbatim. There are no retries here.

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{Operation, StatsSource};
use crate::error::{ConfigError, SourceError, SourceResult};
use crate::models::{RawTable, Scope};

/// Error body returned by the table service.
#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: String,
}

/// Client for the table service.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSource {
    /// Build a client for `base_url`; every call is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: base_url.to_string(),
                message: "not a base URL".to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get(
        &self,
        operation: Operation,
        scope: &Scope,
        stat_type: Option<&str>,
    ) -> SourceResult<RawTable> {
        let url = self
            .base_url
            .join(operation.as_str())
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let mut query: Vec<(&str, &str)> = scope
            .leagues
            .iter()
            .map(|l| ("leagues", l.as_str()))
            .collect();
        query.extend(scope.seasons.iter().map(|s| ("seasons", s.as_str())));
        if let Some(stat) = stat_type {
            query.push(("stat_type", stat));
        }

        info!(%url, operation = %operation, "Requesting table");
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;
        debug!(status = %status, bytes = body.len(), "Table service answered");

        if !status.is_success() {
            let message = serde_json::from_str::<UpstreamError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::InvalidPayload(e.to_string()))
    }
}

impl StatsSource for HttpSource {
    fn name(&self) -> String {
        format!("table service at {}", self.base_url)
    }

    fn read_team_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.get(Operation::TeamSeasonStats, scope, Some(stat_type))
            .boxed()
    }

    fn read_player_season_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.get(Operation::PlayerSeasonStats, scope, Some(stat_type))
            .boxed()
    }

    fn read_schedule<'a>(&'a self, scope: &'a Scope) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.get(Operation::Schedule, scope, None).boxed()
    }

    fn read_player_match_stats<'a>(
        &'a self,
        scope: &'a Scope,
        stat_type: &'a str,
    ) -> BoxFuture<'a, SourceResult<RawTable>> {
        self.get(Operation::PlayerMatchStats, scope, Some(stat_type))
            .boxed()
    }
}
