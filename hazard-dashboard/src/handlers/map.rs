use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use chrono::Utc;
use coastal_common::map::MapView;

use crate::app_state::AppState;
use crate::clients::Session;
use crate::error::{AppError, ErrorResponse};
use crate::handlers::dashboard::FilterParams;
use crate::handlers::session::require_user;
use crate::services::reports;

/// GET /api/v1/map
#[utoipa::path(
    get,
    path = "/api/v1/map",
    params(FilterParams),
    responses(
        (status = 200, description = "Markers, hotspots and legend for the filtered reports", body = MapView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn map(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FilterParams>,
) -> Result<Json<MapView>, AppError> {
    let session = Session::from_headers(&headers);
    require_user(&state, &session).await?;
    let all = reports::current_reports(&state, &session, state.config.dashboard_report_limit).await;
    let filtered = params.report_filter().apply(&all, Utc::now());
    Ok(Json(MapView::from_reports(filtered, &state.config.display_tz())))
}
