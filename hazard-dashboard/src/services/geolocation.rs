use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::clients::Geocoder;
use crate::error::{AppError, GEOLOCATION_FAILED_MESSAGE};

pub const GEOLOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported by this browser.";

/// What the caller's device reported.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PositionReport {
    Fix { latitude: f64, longitude: f64 },
    Failed {
        #[serde(default)]
        reason: Option<String>,
    },
    Unsupported,
}

/// Values for the submit form's location fields.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocationFill {
    pub latitude: String,
    pub longitude: String,
    pub location_name: String,
    pub geocoded: bool,
}

pub fn fallback_location_name(latitude: f64, longitude: f64) -> String {
    format!("Location: {latitude:.4}, {longitude:.4}")
}

pub async fn resolve(geocoder: &Geocoder, report: PositionReport) -> Result<LocationFill, AppError> {
    let (latitude, longitude) = match report {
        PositionReport::Fix { latitude, longitude } if latitude.is_finite() && longitude.is_finite() => {
            (latitude, longitude)
        }
        PositionReport::Fix { .. } => {
            return Err(AppError::Geolocation(GEOLOCATION_FAILED_MESSAGE.to_string()));
        }
        PositionReport::Failed { reason } => {
            debug!("device geolocation failed: {}", reason.unwrap_or_default());
            return Err(AppError::Geolocation(GEOLOCATION_FAILED_MESSAGE.to_string()));
        }
        PositionReport::Unsupported => {
            return Err(AppError::Geolocation(GEOLOCATION_UNSUPPORTED_MESSAGE.to_string()));
        }
    };

    let (location_name, geocoded) = match geocoder.reverse(latitude, longitude).await {
        Ok(name) => (name, true),
        Err(e) => {
            warn!("reverse geocoding failed, using coordinates: {}", e);
            (fallback_location_name(latitude, longitude), false)
        }
    };

    Ok(LocationFill {
        latitude: latitude.to_string(),
        longitude: longitude.to_string(),
        location_name,
        geocoded,
    })
}
