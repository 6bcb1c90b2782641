//! Health and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::conversation::SpeakerLabels;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Gateway status including configured backends
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub session_id: uuid::Uuid,
    pub scenario: String,
    pub chat_backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_backend: Option<&'static str>,
    pub voice_available: bool,
    pub turns: usize,
}

/// Get gateway status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let session = state.session.lock().await;

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        session_id: session.id(),
        scenario: session.scenario().id.clone(),
        chat_backend: state.chat_backend,
        image_backend: state.image_backend,
        voice_available: state.speaker.is_some(),
        turns: session.conversation().len(),
    })
}

/// Scenario info for API responses
#[derive(Serialize)]
pub struct ScenarioInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub labels: SpeakerLabels,
}

/// Get the active scenario
async fn scenario(State(state): State<Arc<ApiState>>) -> Json<ScenarioInfo> {
    let session = state.session.lock().await;
    let scenario = session.scenario();

    Json(ScenarioInfo {
        id: scenario.id.clone(),
        name: scenario.name.clone(),
        tagline: scenario.tagline.clone(),
        labels: scenario.labels.clone(),
    })
}

/// Build status router (needs state)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/scenario", get(scenario))
        .with_state(state)
}
