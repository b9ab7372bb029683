use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use coastal_common::models::{Role, User};
use coastal_common::presentation::{can_view_analytics, navigation_for, role_label, NavItem};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::{ClientError, Session};
use crate::error::{AppError, ErrorResponse};

pub const APP_NAME: &str = "Coastal Monitor";
pub const APP_TAGLINE: &str = "India Hazard System";

/// The signed-in user, or `None` for anonymous callers and rejected tokens.
pub async fn optional_user(state: &AppState, session: &Session) -> Option<User> {
    session.token()?;
    match state.backend.me(session).await {
        Ok(user) => Some(user),
        Err(ClientError::NotAuthenticated) => None,
        Err(e) => {
            warn!("Error loading user: {}", e);
            None
        }
    }
}

/// The signed-in user. Anonymous callers and rejected tokens get
/// `AuthenticationRequired`, which the client answers with the sign-in prompt.
pub async fn require_user(state: &AppState, session: &Session) -> Result<User, AppError> {
    if session.token().is_none() {
        return Err(AppError::AuthenticationRequired);
    }
    Ok(state.backend.me(session).await?)
}

/// GET /api/v1/me
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "The signed-in user", body = User),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>, AppError> {
    let session = Session::from_headers(&headers);
    let user = require_user(&state, &session).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginParams {
    return_to: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub login_url: String,
}

/// GET /api/v1/login
#[utoipa::path(
    get,
    path = "/api/v1/login",
    params(LoginParams),
    responses((status = 200, description = "Where to send the browser to sign in", body = LoginResponse))
)]
pub async fn login(State(state): State<AppState>, Query(params): Query<LoginParams>) -> Json<LoginResponse> {
    let return_to = params
        .return_to
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "/dashboard".to_string());
    Json(LoginResponse {
        login_url: state.backend.login_url(&return_to),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// POST /api/v1/logout
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 200, description = "Session ended", body = LogoutResponse),
        (status = 502, description = "User service failed", body = ErrorResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<LogoutResponse>, AppError> {
    let session = Session::from_headers(&headers);
    if let Some(token) = session.token() {
        state.evict(token);
        match state.backend.logout(&session).await {
            Ok(()) | Err(ClientError::NotAuthenticated) => {}
            Err(e) => return Err(AppError::Backend(e)),
        }
    }
    Ok(Json(LogoutResponse { signed_out: true }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LayoutView {
    pub app_name: String,
    pub tagline: String,
    pub signed_in: bool,
    pub user: Option<User>,
    pub role: Option<Role>,
    pub role_label: Option<String>,
    pub navigation: Vec<NavItem>,
    pub can_view_analytics: bool,
}

impl LayoutView {
    pub fn for_user(user: Option<User>) -> Self {
        let role = user.as_ref().map(|u| u.role);
        Self {
            app_name: APP_NAME.to_string(),
            tagline: APP_TAGLINE.to_string(),
            signed_in: user.is_some(),
            role,
            role_label: role.map(role_label),
            navigation: role.map(navigation_for).unwrap_or_default(),
            can_view_analytics: role.map(can_view_analytics).unwrap_or(false),
            user,
        }
    }
}

/// GET /api/v1/layout
#[utoipa::path(
    get,
    path = "/api/v1/layout",
    responses((status = 200, description = "Navigation for the caller's role", body = LayoutView))
)]
pub async fn layout(State(state): State<AppState>, headers: HeaderMap) -> Json<LayoutView> {
    let session = Session::from_headers(&headers);
    let user = optional_user(&state, &session).await;
    Json(LayoutView::for_user(user))
}
