//! HTTP API - analyze endpoint for SIEM integrations
//!
//! ```text
//! POST /analyze   alert(s) in → scores + triage verdicts out
//! GET  /health    liveness, model status, feature layout
//! ```

pub mod error;
pub mod handlers;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::logic::pipeline::Scorer;
use crate::logic::triage::{Notifier, TriagePolicy};

pub use error::{ApiError, ApiResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<Scorer>,
    pub policy: Arc<TriagePolicy>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(scorer: Scorer, policy: TriagePolicy, notifier: impl Notifier + 'static) -> Self {
        Self {
            scorer: Arc::new(scorer),
            policy: Arc::new(policy),
            notifier: Arc::new(notifier),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/analyze", post(handlers::analyze::analyze))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_router(state);

    log::info!("🚀 Analyze API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
