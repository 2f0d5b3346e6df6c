//! API tests: request shapes, unavailable model, triage response

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::handlers::analyze::{map_text_field, unwrap_payload};
use crate::api::{create_router, AppState};
use crate::logic::alert::{AlertRecord, AlertTable};
use crate::logic::artifacts::ArtifactStore;
use crate::logic::config::TriageConfig;
use crate::logic::model::{BackendConfig, LogisticParams};
use crate::logic::pipeline::{Scorer, Trainer};
use crate::logic::triage::{LogNotifier, TriagePolicy};

fn config(dir: &std::path::Path) -> TriageConfig {
    TriageConfig {
        model_dir: dir.to_path_buf(),
        backend: BackendConfig::Logistic(LogisticParams::default()),
        ..Default::default()
    }
}

fn training_table() -> AlertTable {
    AlertTable::from(
        (0..30)
            .map(|i| {
                let record = AlertRecord::new()
                    .with("timestamp", format!("2024-05-{:02}T10:00:00Z", 1 + i % 28).as_str())
                    .with("agent.name", "win-dc01");
                if i % 3 == 0 {
                    record
                        .with("rule.level", 12i64)
                        .with("full_log", "mimikatz sekurlsa logonpasswords")
                } else {
                    record
                        .with("rule.level", 3i64)
                        .with("full_log", "scheduled backup finished")
                }
            })
            .collect::<Vec<_>>(),
    )
}

fn state(config: &TriageConfig) -> AppState {
    AppState::new(Scorer::load(config), TriagePolicy::from_config(config), LogNotifier)
}

fn trained_state(dir: &std::path::Path) -> AppState {
    let config = config(dir);
    Trainer::new(&config)
        .train_and_save(&training_table(), &ArtifactStore::new(dir))
        .unwrap();
    state(&config)
}

async fn post_analyze(state: AppState, body: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_reports_model_status() {
    let dir = tempfile::tempdir().unwrap();
    let response = create_router(state(&config(dir.path())))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"]["model_loaded"], false);
    assert_eq!(body["layout"]["numeric_columns"], json!(["hour", "weekday", "rule.level"]));
}

#[tokio::test]
async fn test_invalid_bodies_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());

    for body in ["", "not json", "{}", "[]", "null", "42"] {
        let (status, json) = post_analyze(state(&cfg), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(json["status"], "error");
    }
}

#[tokio::test]
async fn test_no_model_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post_analyze(state(&config(dir.path())), r#"{"rule": {"level": 12}}"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_analyze_search_document() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_state(dir.path());

    let doc = json!({
        "_index": "wazuh-alerts",
        "_source": {
            "timestamp": "2024-05-03T10:00:00Z",
            "rule": {"level": 12, "id": "92052", "description": "Credential dumping"},
            "agent": {"name": "win-dc01"},
            "data": {"win": {"system": {"message": "mimikatz sekurlsa logonpasswords"}}}
        }
    });
    let (status, body) = post_analyze(app, &doc.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processed");
    assert_eq!(body["ai_prediction"], 1);
    assert!(body["risk_score"].as_f64().unwrap() >= 0.5);
    assert_eq!(body["alerts"][0]["alert"], true);
    assert_eq!(body["action"], "alert_sent");
}

#[tokio::test]
async fn test_analyze_benign_list() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_state(dir.path());

    let alerts = json!({"alert": [
        {"timestamp": "2024-05-04T10:00:00Z", "rule": {"level": 3}, "full_log": "scheduled backup finished"},
        {"timestamp": "2024-05-05T10:00:00Z", "rule": {"level": 3}, "full_log": "scheduled backup finished"}
    ]});
    let (status, body) = post_analyze(app, &alerts.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_prediction"], 0);
    assert_eq!(body["alerts"].as_array().map(Vec::len), Some(2));
    assert!(body.get("action").is_none());
}

#[test]
fn test_unwrap_payload() {
    let source = json!({"_source": {"a": 1}, "alert": {"b": 2}});
    assert_eq!(unwrap_payload(&source), &json!({"a": 1}));

    let wrapped = json!({"alert": {"b": 2}});
    assert_eq!(unwrap_payload(&wrapped), &json!({"b": 2}));

    let plain = json!({"c": 3});
    assert_eq!(unwrap_payload(&plain), &plain);
}

#[test]
fn test_map_text_field_prefers_windows_message() {
    let mut record = AlertRecord::new()
        .with("data.win.system.message", "Process created: whoami.exe")
        .with("rule.description", "Sysmon event")
        .with("full_log", "raw");
    map_text_field(&mut record);
    assert_eq!(record.text("full_log").as_deref(), Some("Process created: whoami.exe"));

    // Too short to count
    let mut record = AlertRecord::new().with("rule.description", "abc").with("full_log", "x");
    map_text_field(&mut record);
    assert_eq!(record.text("full_log").as_deref(), Some("x"));
}
