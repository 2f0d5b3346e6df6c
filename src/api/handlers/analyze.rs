//! Analyze handler - score alerts pushed by the SIEM integration
//!
//! Accepts a single alert, a list, an `{"alert": ...}` wrapper or a search
//! document (`_source`). Windows events keep their text outside `full_log`,
//! so the first usable candidate field is copied into `full_log` first.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::logic::alert::{AlertRecord, AlertTable};
use crate::logic::triage::RowVerdict;

/// Fields holding alert text, most specific first
pub const TEXT_CANDIDATES: &[&str] = &[
    "data.win.system.message",
    "rule.description",
    "data.win.eventdata.commandLine",
    "full_log",
];

/// Candidate values this short are ignored
const MIN_TEXT_LEN: usize = 5;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub ai_prediction: u8,
    pub risk_score: f64,
    pub alerts: Vec<RowVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

pub async fn analyze(State(state): State<AppState>, body: Bytes) -> ApiResult<impl IntoResponse> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("No JSON data received".into()))?;
    if is_blank(&payload) {
        return Err(ApiError::BadRequest("No JSON data received".into()));
    }

    let mut table = AlertTable::from_json_value(unwrap_payload(&payload))?;
    if table.is_empty() {
        return Err(ApiError::BadRequest("Empty alert batch".into()));
    }
    for record in table.rows_mut() {
        map_text_field(record);
    }
    log_prepared(&table);

    let worker_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let scores = worker_state.scorer.score(&table)?;
        match scores {
            Some(scores) => worker_state
                .policy
                .triage(&table, &scores, worker_state.notifier.as_ref())
                .map(|report| Some((scores, report))),
            None => Ok(None),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("scoring task failed: {}", e)))??;

    let Some((scores, report)) = outcome else {
        let body = serde_json::json!({
            "status": "unavailable",
            "message": "No trained model loaded",
        });
        return Ok((StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response());
    };

    let response = AnalyzeResponse {
        status: "processed",
        ai_prediction: scores.predictions[0],
        risk_score: scores.probabilities[0],
        alerts: report.verdicts,
        action: (report.notices_sent > 0).then_some("alert_sent"),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// `_source` document, `{"alert": ...}` wrapper, or the payload itself
pub fn unwrap_payload(payload: &Value) -> &Value {
    if let Some(source) = payload.get("_source") {
        log::info!("Search document detected, using _source");
        return source;
    }
    payload.get("alert").unwrap_or(payload)
}

/// Copy the first candidate with real text into `full_log`
pub fn map_text_field(record: &mut AlertRecord) {
    let mapped = TEXT_CANDIDATES.iter().find_map(|field| {
        record
            .text(field)
            .filter(|text| text.chars().count() > MIN_TEXT_LEN)
            .map(|text| (*field, text))
    });

    if let Some((field, text)) = mapped {
        if field != "full_log" {
            log::debug!("Mapped text from '{}' to 'full_log'", field);
        }
        record.insert("full_log", text);
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn log_prepared(table: &AlertTable) {
    if let Some(first) = table.rows().first() {
        for field in ["rule.level", "rule.id", "agent.name", "full_log"] {
            let value = first.text(field).unwrap_or_else(|| "MISSING".to_string());
            log::debug!("   - {}: {}", field, value.chars().take(100).collect::<String>());
        }
    }
}
