use serde::Deserialize;

use super::{check_status, ClientError};
use crate::config::Config;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted: Option<String>,
}

/// OpenCage-style reverse geocoder.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Geocoder {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
            api_key: config.usable_geocoder_key().map(str::to_string),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Human readable place name for a coordinate pair.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, ClientError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ClientError::NotConfigured("OPENCAGE_API_KEY"))?;
        let query = format!("{latitude} {longitude}");
        let req = self.http.get(format!("{}/geocode/v1/json", self.base_url)).query(&[
            ("q", query.as_str()),
            ("key", key),
            ("no_annotations", "1"),
        ]);
        let resp = check_status(req.send().await?).await?;
        let body = resp
            .json::<GeocodeResponse>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        body.results
            .into_iter()
            .next()
            .and_then(|r| r.formatted)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClientError::Decode("no geocoding results".to_string()))
    }
}
