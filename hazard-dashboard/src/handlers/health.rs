use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

fn build_version() -> &'static str {
    option_env!("HAZARD_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    pub llm_provider: String,
    pub geocoder_configured: bool,
    /// Signed-in sessions with a report snapshot in memory.
    pub cached_sessions: usize,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up, with build and upstream settings", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "hazard-dashboard".to_string(),
        version: build_version().to_string(),
        git_sha: option_env!("HAZARD_GIT_SHA").map(str::to_string),
        llm_provider: state.llm.provider_name().to_string(),
        geocoder_configured: state.geocoder.is_configured(),
        cached_sessions: state.snapshots.len(),
    };

    (StatusCode::OK, Json(response))
}
