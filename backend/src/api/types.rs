//! REST API types for frontend integration.
//!
//! Field names are snake_case, as dashboards consume them directly.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::PipelineError;
use crate::transform::pipeline::PreviewOutput;

/// Response for `POST /api/preview` and the final `done` SSE frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewResponse {
    pub success: bool,

    /// Column names, in table order
    pub columns: Vec<String>,

    /// First rows of the table, one object per row
    pub preview: Vec<Map<String, Value>>,

    /// Size of the full table, not of the preview
    pub total_rows: usize,
    pub total_cols: usize,

    /// Whether the source was skipped thanks to the cache
    pub cached: bool,
}

impl From<PreviewOutput> for PreviewResponse {
    fn from(output: PreviewOutput) -> Self {
        let preview = output.preview;
        PreviewResponse {
            success: true,
            columns: preview.columns,
            preview: preview.rows,
            total_rows: preview.row_count,
            total_cols: preview.column_count,
            cached: output.cached,
        }
    }
}

/// Response for `GET /api/teams`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query string of `GET /api/teams`
#[derive(Debug, Clone, Deserialize)]
pub struct TeamsParams {
    #[serde(default = "default_league")]
    pub league: String,
    #[serde(default = "default_season")]
    pub season: String,
}

fn default_league() -> String {
    "epl".to_string()
}

fn default_season() -> String {
    "2324".to_string()
}

/// Query string of `GET /api/stats`
#[derive(Debug, Clone, Deserialize)]
pub struct StatsParams {
    #[serde(default = "default_data_type", alias = "category")]
    pub data_type: String,
}

fn default_data_type() -> String {
    "team".to_string()
}

/// HTTP status for a pipeline failure.
pub fn error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::Upstream(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Normalization(_) | PipelineError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Create an error response
pub fn error_response(error: &str, kind: &str) -> Value {
    json!({
        "success": false,
        "error": error,
        "kind": kind,
    })
}

/// Error response for a pipeline failure.
pub fn pipeline_error_response(error: &PipelineError) -> Value {
    error_response(&error.to_string(), error.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RequestError, SourceError};
    use crate::export::Preview;

    #[test]
    fn test_preview_response_fields() {
        let mut row = Map::new();
        row.insert("team".into(), json!("Arsenal"));
        let response = PreviewResponse::from(PreviewOutput {
            preview: Preview {
                row_count: 500,
                column_count: 1,
                columns: vec!["team".into()],
                rows: vec![row],
            },
            cached: true,
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["total_rows"], 500);
        assert_eq!(value["total_cols"], 1);
        assert_eq!(value["preview"][0]["team"], "Arsenal");
        assert_eq!(value["cached"], true);
    }

    #[test]
    fn test_error_status_mapping() {
        let invalid: PipelineError = RequestError::EmptySeason.into();
        assert_eq!(error_status(&invalid), StatusCode::BAD_REQUEST);

        let upstream: PipelineError = SourceError::Request("timed out".into()).into();
        assert_eq!(error_status(&upstream), StatusCode::BAD_GATEWAY);

        let body = pipeline_error_response(&upstream);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "upstream_failure");
        assert!(body["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_teams_response_omits_missing_error() {
        let ok = TeamsResponse {
            teams: vec!["Arsenal".into()],
            error: None,
        };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "teams": ["Arsenal"] }));
    }
}
