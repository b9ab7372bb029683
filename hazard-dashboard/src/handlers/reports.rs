use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::Session;
use crate::error::{AppError, ErrorResponse};
use crate::handlers::session::require_user;
use crate::services::reports;
use crate::services::submission::{
    self, ReportDraft, SubmissionErrorResponse, SubmissionFailure, SubmissionReceipt,
};

/// POST /api/v1/reports
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = ReportDraft,
    responses(
        (status = 201, description = "Report created", body = SubmissionReceipt),
        (status = 400, description = "Required fields missing or invalid", body = SubmissionErrorResponse),
        (status = 401, description = "Not signed in", body = SubmissionErrorResponse),
        (status = 502, description = "Upload or create failed", body = SubmissionErrorResponse)
    )
)]
pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ReportDraft>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), SubmissionFailure> {
    let session = Session::from_headers(&headers);
    require_user(&state, &session)
        .await
        .map_err(SubmissionFailure::before_start)?;
    let receipt = submission::submit(&state, &session, draft).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub reports: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/reports/refresh
#[utoipa::path(
    post,
    path = "/api/v1/reports/refresh",
    responses(
        (status = 200, description = "Snapshot reloaded", body = RefreshResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 502, description = "Report store failed", body = ErrorResponse)
    )
)]
pub async fn refresh_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AppError> {
    let session = Session::from_headers(&headers);
    let count = reports::refresh(&state, &session).await?;
    Ok(Json(RefreshResponse {
        reports: count,
        loaded_at: reports::loaded_at(&state, &session),
    }))
}
