use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::clients::ClientError;

pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit report. Please try again.";
pub const INFERENCE_FAILED_MESSAGE: &str = "AI analysis failed. Please try again.";
pub const GEOLOCATION_FAILED_MESSAGE: &str =
    "Unable to retrieve your location. Please enter coordinates manually.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("missing or invalid fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("media upload failed: {0}")]
    Upload(ClientError),

    #[error("report creation failed: {0}")]
    Create(ClientError),

    #[error("inference failed: {0}")]
    Inference(ClientError),

    #[error("{0}")]
    Geolocation(String),

    #[error("backend request failed: {0}")]
    Backend(ClientError),
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NotAuthenticated => AppError::AuthenticationRequired,
            other => AppError::Backend(other),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Geolocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upload(_) | AppError::Create(_) | AppError::Inference(_) | AppError::Backend(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// What the caller sees. Upstream details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Upload(_) | AppError::Create(_) => SUBMIT_FAILED_MESSAGE.to_string(),
            AppError::Validation(fields) => {
                format!("Please fill in all required fields: {}", fields.join(", "))
            }
            AppError::Inference(_) => INFERENCE_FAILED_MESSAGE.to_string(),
            AppError::Backend(_) => "Upstream service unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected: {}", self);
        }
        let fields = match &self {
            AppError::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: self.public_message(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
