use axum::response::Json;
use utoipa::OpenApi;

use coastal_common::filter::FilterOption;
use coastal_common::map::{HotspotCircle, LegendEntry, MapMarker, MapView};
use coastal_common::models::{HazardReport, HazardType, ReportStatus, Role, Severity, User};
use coastal_common::presentation::{NavItem, ReportCard};
use coastal_common::stats::{HazardTypeCount, LocationEntry, ReportStats, SeverityCount, TimelineDay};

use crate::error::ErrorResponse;
use crate::handlers::analytics::{AnalyticsOverview, AnalyticsView};
use crate::handlers::dashboard::DashboardView;
use crate::handlers::health::HealthResponse;
use crate::handlers::reports::RefreshResponse;
use crate::handlers::session::{LayoutView, LoginResponse, LogoutResponse};
use crate::services::geolocation::{LocationFill, PositionReport};
use crate::services::social_analysis::{
    EngagementMetrics, GeographicHotspot, MisinformationRisk, SentimentBreakdown, SocialAnalysis,
    SocialAnalysisCache,
};
use crate::services::submission::{
    MediaUpload, ReportDraft, SubmissionErrorResponse, SubmissionPhase, SubmissionReceipt,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::session::me,
        crate::handlers::session::login,
        crate::handlers::session::logout,
        crate::handlers::session::layout,
        crate::handlers::dashboard::dashboard,
        crate::handlers::map::map,
        crate::handlers::analytics::analytics,
        crate::handlers::analytics::social_cached,
        crate::handlers::analytics::social_run,
        crate::handlers::reports::submit_report,
        crate::handlers::reports::refresh_reports,
        crate::handlers::geolocation::resolve,
    ),
    components(
        schemas(
            HazardReport, HazardType, Severity, ReportStatus, Role, User,
            ReportCard, NavItem, FilterOption, ReportStats, HazardTypeCount, SeverityCount,
            TimelineDay, LocationEntry, MapView, MapMarker, HotspotCircle, LegendEntry,
            DashboardView, AnalyticsView, AnalyticsOverview, LayoutView, LoginResponse,
            LogoutResponse, RefreshResponse, HealthResponse, ErrorResponse,
            ReportDraft, MediaUpload, SubmissionPhase, SubmissionReceipt, SubmissionErrorResponse,
            PositionReport, LocationFill,
            SocialAnalysis, SocialAnalysisCache, SentimentBreakdown, GeographicHotspot,
            EngagementMetrics, MisinformationRisk,
        )
    ),
    tags(
        (name = "hazard-dashboard", description = "Coastal hazard reports, dashboard, map and analytics views")
    )
)]
pub struct ApiDoc;

/// GET /api/v1/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
