use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use chrono::{DateTime, Utc};
use coastal_common::filter::{filter_options, FilterOption, ReportFilter};
use coastal_common::models::User;
use coastal_common::presentation::ReportCard;
use coastal_common::stats::ReportStats;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::Session;
use crate::error::{AppError, ErrorResponse};
use crate::handlers::session::require_user;
use crate::services::reports;

pub const NO_MATCHES_MESSAGE: &str = "No reports match the current filter.";

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// all, critical_high, unverified, recent or a hazard type
    pub filter: Option<String>,
}

impl FilterParams {
    pub fn report_filter(&self) -> ReportFilter {
        self.filter
            .as_deref()
            .unwrap_or_default()
            .parse()
            .unwrap_or(ReportFilter::All)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub user: User,
    pub stats: ReportStats,
    pub filter: String,
    pub filter_options: Vec<FilterOption>,
    pub reports: Vec<ReportCard>,
    pub empty_message: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(FilterParams),
    responses(
        (status = 200, description = "Stats and filtered report cards", body = DashboardView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FilterParams>,
) -> Result<Json<DashboardView>, AppError> {
    let session = Session::from_headers(&headers);
    let user = require_user(&state, &session).await?;
    let all = reports::current_reports(&state, &session, state.config.dashboard_report_limit).await;

    let tz = state.config.display_tz();
    let now = Utc::now();
    let filter = params.report_filter();
    let cards: Vec<ReportCard> = filter
        .apply(&all, now)
        .into_iter()
        .map(|r| ReportCard::from_report(r, &tz))
        .collect();

    Ok(Json(DashboardView {
        user,
        stats: ReportStats::compute(&all, &now.with_timezone(&tz)),
        filter: filter.to_string(),
        filter_options: filter_options(),
        empty_message: cards.is_empty().then(|| NO_MATCHES_MESSAGE.to_string()),
        reports: cards,
        loaded_at: reports::loaded_at(&state, &session),
    }))
}
