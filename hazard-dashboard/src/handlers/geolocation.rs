use axum::{extract::State, response::Json};

use crate::app_state::AppState;
use crate::error::{AppError, ErrorResponse};
use crate::services::geolocation::{self, LocationFill, PositionReport};

/// POST /api/v1/geolocation/resolve
#[utoipa::path(
    post,
    path = "/api/v1/geolocation/resolve",
    request_body = PositionReport,
    responses(
        (status = 200, description = "Coordinates and a place name for the form", body = LocationFill),
        (status = 422, description = "The device could not provide a position", body = ErrorResponse)
    )
)]
pub async fn resolve(
    State(state): State<AppState>,
    Json(report): Json<PositionReport>,
) -> Result<Json<LocationFill>, AppError> {
    let fill = geolocation::resolve(&state.geocoder, report).await?;
    Ok(Json(fill))
}
