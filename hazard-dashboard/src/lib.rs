//! Backend-for-frontend for the coastal hazard reporting system: view models
//! for the dashboard, map, analytics and submit screens, assembled from the
//! managed backend's report store, user service, blob store and LLM.

pub mod app_state;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod snapshot;

#[cfg(test)]
pub mod test_support;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app_state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/me", get(handlers::session::me))
        .route("/api/v1/login", get(handlers::session::login))
        .route("/api/v1/logout", post(handlers::session::logout))
        .route("/api/v1/layout", get(handlers::session::layout))
        .route("/api/v1/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/v1/map", get(handlers::map::map))
        .route("/api/v1/analytics", get(handlers::analytics::analytics))
        .route(
            "/api/v1/analytics/social",
            get(handlers::analytics::social_cached).post(handlers::analytics::social_run),
        )
        .route("/api/v1/reports", post(handlers::reports::submit_report))
        .route("/api/v1/reports/refresh", post(handlers::reports::refresh_reports))
        .route("/api/v1/geolocation/resolve", post(handlers::geolocation::resolve))
        .route("/api/v1/openapi.json", get(openapi::openapi_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
