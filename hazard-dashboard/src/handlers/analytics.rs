use axum::{extract::State, http::HeaderMap, response::Json};
use chrono::Utc;
use coastal_common::models::User;
use coastal_common::presentation::can_view_analytics;
use coastal_common::stats::{
    average_urgency, count_by_hazard_type, format_average_urgency, severity_distribution, timeline,
    top_locations, total_social_mentions, HazardTypeCount, LocationEntry, SeverityCount, TimelineDay,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::Session;
use crate::error::{AppError, ErrorResponse};
use crate::handlers::session::require_user;
use crate::services::reports;
use crate::services::social_analysis::{self, SocialAnalysisCache};

pub const ACCESS_RESTRICTED_MESSAGE: &str =
    "Analytics dashboard is only available for officials and analysts.";

/// Officials and analysts only. Citizens get the access-restricted message.
async fn analytics_user(state: &AppState, session: &Session) -> Result<User, AppError> {
    let user = require_user(state, session).await?;
    if !can_view_analytics(user.role) {
        return Err(AppError::Forbidden(ACCESS_RESTRICTED_MESSAGE.to_string()));
    }
    Ok(user)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsOverview {
    pub total_reports: usize,
    pub high_priority: usize,
    pub social_mentions: u64,
    pub average_urgency: Option<f64>,
    pub average_urgency_display: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsView {
    pub user: User,
    pub overview: AnalyticsOverview,
    pub hazard_types: Vec<HazardTypeCount>,
    pub severity_distribution: Vec<SeverityCount>,
    pub timeline: Vec<TimelineDay>,
    pub top_locations: Vec<LocationEntry>,
    pub social: SocialAnalysisCache,
}

/// GET /api/v1/analytics
#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    responses(
        (status = 200, description = "Overview cards, charts and trends", body = AnalyticsView),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Signed in as a citizen", body = ErrorResponse)
    )
)]
pub async fn analytics(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<AnalyticsView>, AppError> {
    let session = Session::from_headers(&headers);
    let user = analytics_user(&state, &session).await?;
    let all = reports::current_reports(&state, &session, state.config.analytics_report_limit).await;
    let now = Utc::now().with_timezone(&state.config.display_tz());

    let average = average_urgency(&all);
    Ok(Json(AnalyticsView {
        user,
        overview: AnalyticsOverview {
            total_reports: all.len(),
            high_priority: all.iter().filter(|r| r.severity.is_high_or_critical()).count(),
            social_mentions: total_social_mentions(&all),
            average_urgency: average,
            average_urgency_display: format_average_urgency(average),
        },
        hazard_types: count_by_hazard_type(&all),
        severity_distribution: severity_distribution(&all),
        timeline: timeline(&all, &now),
        top_locations: top_locations(&all),
        social: social_analysis::cached(&state, &session),
    }))
}

/// GET /api/v1/analytics/social
#[utoipa::path(
    get,
    path = "/api/v1/analytics/social",
    responses(
        (status = 200, description = "Last generated social-media analysis", body = SocialAnalysisCache),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Signed in as a citizen", body = ErrorResponse)
    )
)]
pub async fn social_cached(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SocialAnalysisCache>, AppError> {
    let session = Session::from_headers(&headers);
    analytics_user(&state, &session).await?;
    Ok(Json(social_analysis::cached(&state, &session)))
}

/// POST /api/v1/analytics/social
#[utoipa::path(
    post,
    path = "/api/v1/analytics/social",
    responses(
        (status = 200, description = "Fresh analysis, or the previous one with last_error set", body = SocialAnalysisCache),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Signed in as a citizen", body = ErrorResponse)
    )
)]
pub async fn social_run(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SocialAnalysisCache>, AppError> {
    let session = Session::from_headers(&headers);
    analytics_user(&state, &session).await?;
    Ok(Json(social_analysis::run(&state, &session).await))
}
