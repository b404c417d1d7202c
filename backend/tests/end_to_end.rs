//! End-to-end tests: raw tables through the public API, the fixture source and
//! the HTTP server.

use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use statlab::{
    export_filename, filter_by_team, normalize, preview, server, to_csv, Config, FetchRequest,
    MemorySource, Operation, Pipeline, RawRow, RawTable, RawValue, TableCache,
};

fn composite_team_table() -> RawTable {
    RawTable {
        index_names: vec![],
        columns: vec![
            vec!["", "team"].into(),
            vec!["Performance", "Gls"].into(),
            vec!["Performance", "Ast"].into(),
        ],
        rows: vec![
            RawRow {
                index: vec![],
                values: vec!["Arsenal".into(), RawValue::Int(10), RawValue::Int(5)],
            },
            RawRow {
                index: vec![],
                values: vec!["Chelsea".into(), RawValue::Int(8), RawValue::Int(9)],
            },
        ],
    }
}

fn schedule_table() -> RawTable {
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
                values: vec!["Everton".into(), "Fulham".into(), "0-0".into()],
            },
        ],
    }
}

#[test]
fn composite_columns_normalize_and_filter() {
    let table = normalize(&composite_team_table()).unwrap();
    assert_eq!(
        table.columns(),
        ["team", "Performance - Gls", "Performance - Ast"]
    );
    assert_eq!(table.row_count(), 2);

    let filtered = filter_by_team(table, &["Chelsea"]);
    assert_eq!(filtered.row_count(), 1);
    assert_eq!(
        Value::Object(filtered.row_map(0).unwrap()),
        json!({ "team": "Chelsea", "Performance - Gls": 8, "Performance - Ast": 9 })
    );
}

#[test]
fn schedule_matches_away_team() {
    let table = filter_by_team(normalize(&schedule_table()).unwrap(), &["Chelsea"]);
    assert_eq!(table.row_count(), 1);
    assert_eq!(
        Value::Object(table.row_map(0).unwrap()),
        json!({ "home_team": "Arsenal", "away_team": "Chelsea", "score": "2-1" })
    );
}

#[test]
fn filename_for_team_shooting() {
    let none: [&str; 0] = [];
    assert_eq!(
        export_filename(
            statlab::Category::Team,
            &["epl"],
            &["2324"],
            Some("shooting"),
            &none
        ),
        "team_epl_2324_shooting.csv"
    );
}

#[test]
fn large_preview_is_bounded() {
    let raw = RawTable {
        index_names: vec!["team".into()],
        columns: vec!["Gls".into()],
        rows: (0..500)
            .map(|i| RawRow {
                index: vec![RawValue::Text(format!("Team {}", i))],
                values: vec![RawValue::Int(i)],
            })
            .collect(),
    };
    let p = preview(&normalize(&raw).unwrap(), 20);
    assert_eq!(p.rows.len(), 20);
    assert_eq!(p.row_count, 500);

    let csv = String::from_utf8(to_csv(&normalize(&raw).unwrap()).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 501);
}

#[tokio::test]
async fn fixture_source_pipeline_exports_csv() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("player_season_stats_keeper.json"),
        r#"{
            "index_names": ["league", "season", "team", "player"],
            "columns": [["Performance", "GA"], ["Performance", "Save%"], ["", "Born"]],
            "rows": [
                { "index": ["ENG-Premier League", "2324", "Arsenal", "David Raya"],
                  "values": [24, 70.9, {"date": "1995-09-15"}] },
                { "index": ["ENG-Premier League", "2324", "Chelsea", "Robert Sánchez"],
                  "values": [30, null, {"date": "1997-11-18"}] },
                { "index": ["ESP-La Liga", "2324", "Girona", "Paulo Gazzaniga"],
                  "values": [44, 68.0, null] }
            ]
        }"#,
    )
    .unwrap();

    let pipeline = Config::default()
        .with_fixture_dir(dir.path())
        .build_pipeline()
        .unwrap();

    let export = pipeline
        .export(&FetchRequest {
            leagues: vec!["epl".into()],
            seasons: vec!["2324".into()],
            data_type: "player".into(),
            stat_type: Some("keeper".into()),
            teams: vec!["Chelsea".into(), "Arsenal".into()],
        })
        .await
        .unwrap();

    assert_eq!(export.filename, "player_epl_2324_keeper_Chelsea_Arsenal.csv");
    assert_eq!(export.row_count, 2);
    assert_eq!(
        String::from_utf8(export.bytes).unwrap(),
        "league,season,team,player,Performance - GA,Performance - Save%,Born\n\
         ENG-Premier League,2324,Arsenal,David Raya,24,70.9,1995-09-15\n\
         ENG-Premier League,2324,Chelsea,Robert Sánchez,30,,1997-11-18\n"
    );
}

#[tokio::test]
async fn missing_source_is_a_config_error() {
    let err = Config::default().build_pipeline().err().unwrap();
    assert!(matches!(err, statlab::ConfigError::NoSource));
}

async fn spawn_server(source: MemorySource) -> String {
    let pipeline = Pipeline::new(Arc::new(source)).with_cache(TableCache::default());
    let app = server::app(Arc::new(pipeline), Duration::from_secs(30));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sse_frames(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn fetch_progress_streams_checkpoints_then_result() {
    let base = spawn_server(MemorySource::new().with_table(Operation::Schedule, schedule_table())).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/fetch-progress", base))
        .json(&json!({ "data_type": "schedule", "teams": ["Fulham"] }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let frames = sse_frames(&body);
    let stages: Vec<&str> = frames.iter().map(|f| f["stage"].as_str().unwrap()).collect();
    assert_eq!(
        stages,
        vec!["init", "connect", "fetch", "process", "format", "complete", "done"]
    );

    let progress: Vec<u64> = frames
        .iter()
        .filter_map(|f| f["progress"].as_u64())
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let done = frames.last().unwrap();
    assert_eq!(done["success"], true);
    assert_eq!(done["total_rows"], 1);
    assert_eq!(done["preview"][0]["home_team"], "Everton");
}

#[tokio::test]
async fn fetch_progress_ends_with_error_frame() {
    let base = spawn_server(MemorySource::failing("FBref is down")).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/fetch-progress", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let frames = sse_frames(&body);
    let last = frames.last().unwrap();
    assert_eq!(last["stage"], "error");
    assert_eq!(last["kind"], "upstream_failure");
    assert!(last["error"].as_str().unwrap().contains("FBref is down"));
}

#[tokio::test]
async fn preview_endpoint_rejects_unknown_leagues() {
    let base = spawn_server(MemorySource::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/preview", base))
        .json(&json!({ "leagues": ["mls"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("No valid leagues provided"));
}

#[tokio::test]
async fn catalog_endpoints() {
    let base = spawn_server(MemorySource::new()).await;
    let client = reqwest::Client::new();

    let leagues: Value = client
        .get(format!("{}/api/leagues", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(leagues[0]["key"], "epl");
    assert_eq!(leagues[0]["id"], "ENG-Premier League");

    let stats: Value = client
        .get(format!("{}/api/stats?data_type=schedule", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats, json!([]));

    let health: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["cache"], true);
    assert_eq!(health["cache_ttl_secs"], 3600);
}
