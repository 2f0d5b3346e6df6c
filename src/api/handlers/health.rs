//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;
use crate::logic::features::LayoutInfo;
use crate::logic::pipeline::ModelStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelStatus,
    layout: LayoutInfo,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model: state.scorer.status(),
        layout: LayoutInfo::current(),
    })
}
