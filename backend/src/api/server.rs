//! HTTP Server for the statlab API.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/`, `/api/health`    | Health check                             |
//! | GET    | `/api/leagues`        | League catalog                           |
//! | GET    | `/api/seasons`        | Suggested seasons                        |
//! | GET    | `/api/categories`     | Categories and their stat subtypes       |
//! | GET    | `/api/stats`          | Stat subtypes for `?data_type=`          |
//! | GET    | `/api/teams`          | Teams of `?league=&season=`              |
//! | POST   | `/api/preview`        | Bounded JSON preview of a table          |
//! | POST   | `/api/download`       | Full table as CSV                        |
//! | POST   | `/api/fetch-progress` | SSE progress stream, then the preview    |

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::Event, sse::KeepAlive, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use super::progress::StreamFrame;
use super::types::{
    error_response, error_status, pipeline_error_response, PreviewResponse, StatsParams,
    TeamsParams, TeamsResponse,
};
use crate::catalog::{self, CategoryInfo, LeagueInfo, SeasonOption, StatOption};
use crate::config::Config;
use crate::error::{PipelineError, ServerError};
use crate::models::{Category, FetchRequest};
use crate::transform::pipeline::Pipeline;

type ApiError = (StatusCode, Json<Value>);

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

/// Build the router; `request_timeout` bounds how long a handler may run.
pub fn app(pipeline: Arc<Pipeline>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/leagues", get(list_leagues))
        .route("/api/seasons", get(list_seasons))
        .route("/api/categories", get(list_categories))
        .route("/api/stats", get(stat_types))
        .route("/api/teams", get(teams))
        .route("/api/preview", post(preview))
        .route("/api/download", post(download))
        .route("/api/fetch-progress", post(fetch_progress))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(AppState::new(pipeline))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), ServerError> {
    let pipeline = Arc::new(config.build_pipeline()?);
    let app = app(pipeline, config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "statlab server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn rejected(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        Json(error_response(&rejection.body_text(), "invalid_request")),
    )
}

fn failed(error: PipelineError) -> ApiError {
    warn!(kind = error.kind(), error = %error, "Request failed");
    (error_status(&error), Json(pipeline_error_response(&error)))
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "statlab",
        "version": env!("CARGO_PKG_VERSION"),
        "source": state.pipeline.source_name(),
        "cache": state.pipeline.cache().is_some(),
        "cache_ttl_secs": state.pipeline.cache().map(|c| c.ttl().as_secs()),
    }))
}

async fn list_leagues() -> Json<&'static [LeagueInfo]> {
    Json(catalog::leagues())
}

async fn list_seasons() -> Json<&'static [SeasonOption]> {
    Json(catalog::SEASONS)
}

async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(Category::ALL.into_iter().map(catalog::category_info).collect())
}

/// Stat subtypes for a category; unknown categories get an empty list.
async fn stat_types(Query(params): Query<StatsParams>) -> Json<&'static [StatOption]> {
    let options = params
        .data_type
        .parse::<Category>()
        .map(catalog::stat_options)
        .unwrap_or_default();
    Json(options)
}

/// Team names; failures are reported in the body next to an empty list.
async fn teams(
    State(state): State<AppState>,
    Query(params): Query<TeamsParams>,
) -> Json<TeamsResponse> {
    match state.pipeline.teams(&params.league, &params.season).await {
        Ok(teams) => Json(TeamsResponse { teams, error: None }),
        Err(e) => {
            warn!(league = %params.league, season = %params.season, error = %e, "Team lookup failed");
            Json(TeamsResponse {
                teams: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}

async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(request) = payload.map_err(rejected)?;
    let output = state
        .pipeline
        .preview(&request, None)
        .await
        .map_err(failed)?;
    Ok(Json(output.into()))
}

async fn download(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(rejected)?;
    let export = state.pipeline.export(&request).await.map_err(failed)?;
    info!(filename = %export.filename, rows = export.row_count, "Serving CSV");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&export.filename),
            ),
        ],
        export.bytes,
    )
        .into_response())
}

/// Attachment header with an ASCII fallback name plus the RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{:02X}", byte);
        }
    }

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// SSE endpoint: progress frames while the table is fetched, then one final
/// `done` or `error` frame, after which the stream ends.
async fn fetch_progress(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<StreamFrame>();

    match payload {
        Ok(Json(request)) => {
            let pipeline = state.pipeline.clone();
            tokio::spawn(async move {
                let frame = match pipeline.preview_with_progress(&request, None, &tx).await {
                    Ok(output) => StreamFrame::Done(output.into()),
                    Err(e) => {
                        warn!(kind = e.kind(), error = %e, "Streamed request failed");
                        StreamFrame::Failed {
                            error: e.to_string(),
                            kind: e.kind(),
                        }
                    }
                };
                let _ = tx.send(frame);
            });
        }
        Err(rejection) => {
            let _ = tx.send(StreamFrame::Failed {
                error: rejection.body_text(),
                kind: "invalid_request",
            });
        }
    }

    let stream = frames_until_final(rx)
        .map(|frame| Ok(Event::default().data(frame.to_json().to_string())));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Frames of one streamed request, ending with the first final frame.
fn frames_until_final(rx: mpsc::UnboundedReceiver<StreamFrame>) -> impl Stream<Item = StreamFrame> {
    let mut open = true;
    UnboundedReceiverStream::new(rx).take_while(move |frame| {
        let keep = open;
        open = !frame.is_final();
        keep
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawRow, RawTable, RawValue};
    use crate::source::{MemorySource, Operation};

    fn state(source: MemorySource) -> State<AppState> {
        State(AppState::new(Arc::new(Pipeline::new(Arc::new(source)))))
    }

    fn schedule() -> RawTable {
        RawTable {
            index_names: vec![],
            columns: vec!["home_team".into(), "away_team".into(), "score".into()],
            rows: vec![
                RawRow {
                    index: vec![],
                    values: vec!["Arsenal".into(), "Chelsea".into(), "2-1".into()],
                },
                RawRow {
                    index: vec![],
                    values: vec!["Everton".into(), "Fulham".into(), RawValue::Missing],
                },
            ],
        }
    }

    fn schedule_request(teams: &[&str]) -> FetchRequest {
        FetchRequest {
            data_type: "schedule".into(),
            teams: teams.iter().map(|t| t.to_string()).collect(),
            ..FetchRequest::default()
        }
    }

    #[tokio::test]
    async fn test_preview_ok() {
        let state = state(MemorySource::new().with_table(Operation::Schedule, schedule()));
        let Json(response) = preview(state, Ok(Json(schedule_request(&["Chelsea"]))))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.total_rows, 1);
        assert_eq!(response.columns, vec!["home_team", "away_team", "score"]);
        assert_eq!(response.preview[0]["score"], "2-1");
    }

    #[tokio::test]
    async fn test_preview_invalid_request() {
        let state = state(MemorySource::new());
        let request = FetchRequest {
            data_type: "fixtures".into(),
            ..FetchRequest::default()
        };
        let (status, Json(body)) = preview(state, Ok(Json(request))).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn test_preview_upstream_failure() {
        let state = state(MemorySource::failing("FBref returned 429"));
        let (status, Json(body)) = preview(state, Ok(Json(schedule_request(&[]))))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("FBref returned 429"));
    }

    #[tokio::test]
    async fn test_download_headers_and_body() {
        let state = state(MemorySource::new().with_table(Operation::Schedule, schedule()));
        let response = download(state, Ok(Json(schedule_request(&[])))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"schedule_epl_2324.csv\""));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "home_team,away_team,score\nArsenal,Chelsea,2-1\nEverton,Fulham,\n"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("team_laliga_2324_standard_Atlético Madrid.csv");
        let value = value.to_str().unwrap();
        assert!(value.contains("filename=\"team_laliga_2324_standard_Atl_tico Madrid.csv\""));
        assert!(value.contains("filename*=UTF-8''team_laliga_2324_standard_Atl%C3%A9tico%20Madrid.csv"));
    }

    #[tokio::test]
    async fn test_teams_reports_failure_in_body() {
        let state = state(MemorySource::failing("down"));
        let Json(response) = teams(
            state,
            Query(TeamsParams {
                league: "epl".into(),
                season: "2324".into(),
            }),
        )
        .await;
        assert!(response.teams.is_empty());
        assert!(response.error.unwrap().contains("down"));
    }

    #[tokio::test]
    async fn test_stat_types_unknown_category_is_empty() {
        let Json(options) = stat_types(Query(StatsParams {
            data_type: "cricket".into(),
        }))
        .await;
        assert!(options.is_empty());

        let Json(options) = stat_types(Query(StatsParams {
            data_type: "player_match".into(),
        }))
        .await;
        assert_eq!(options[0].value, "summary");
    }

    #[tokio::test]
    async fn test_stream_ends_at_final_frame() {
        use crate::api::progress::{ProgressEvent, Stage};
        use tokio_stream::StreamExt as _;

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(StreamFrame::Progress(ProgressEvent::new(Stage::Init, 5, "Starting")))
            .unwrap();
        tx.send(StreamFrame::Failed {
            error: "down".into(),
            kind: "upstream_failure",
        })
        .unwrap();
        tx.send(StreamFrame::Progress(ProgressEvent::new(Stage::Fetch, 30, "late")))
            .unwrap();

        // the sender is still alive, so only the final frame can end the stream
        let frames: Vec<StreamFrame> = frames_until_final(rx).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[1].is_final());
        drop(tx);
    }

    #[tokio::test]
    async fn test_health_reports_cache_ttl() {
        let pipeline = Pipeline::new(Arc::new(MemorySource::new()))
            .with_cache(crate::cache::TableCache::new(4, Duration::from_secs(90)));
        let Json(body) = health(State(AppState::new(Arc::new(pipeline)))).await;
        assert_eq!(body["cache"], true);
        assert_eq!(body["cache_ttl_secs"], 90);

        let Json(body) = health(state(MemorySource::new())).await;
        assert_eq!(body["cache_ttl_secs"], Value::Null);
    }
}
