use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder key found in unconfigured deployments; treated as no key.
pub const PLACEHOLDER_GEOCODER_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// The managed backend's InvokeLLM integration.
    Backend,
    Gemini,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backend" => Ok(LlmProvider::Backend),
            "gemini" => Ok(LlmProvider::Gemini),
            other => Err(ConfigError::InvalidEnvVar(
                "LLM_PROVIDER".to_string(),
                format!("unsupported provider '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub backend_base_url: String,
    pub backend_app_id: String,
    pub llm_provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub geocoder_api_key: Option<String>,
    pub geocoder_base_url: String,
    pub http_timeout_secs: u64,
    pub dashboard_report_limit: usize,
    pub analytics_report_limit: usize,
    pub display_utc_offset_minutes: i32,
    pub submit_redirect_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_base_url = env::var("BACKEND_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("BACKEND_BASE_URL".to_string()))?;

        let backend_app_id = env::var("BACKEND_APP_ID")
            .map_err(|_| ConfigError::MissingEnvVar("BACKEND_APP_ID".to_string()))?;

        Self::from_env_with(backend_base_url, backend_app_id)
    }

    /// Everything but the backend location from the environment.
    pub fn from_env_with(backend_base_url: String, backend_app_id: String) -> Result<Self, ConfigError> {
        let llm_provider = match env::var("LLM_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => LlmProvider::Backend,
        };

        Ok(Config {
            port: parse_var("PORT", 8080)?,
            backend_base_url: backend_base_url.trim_end_matches('/').to_string(),
            backend_app_id,
            llm_provider,
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-flash-latest".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            geocoder_api_key: optional_var("OPENCAGE_API_KEY"),
            geocoder_base_url: env::var("OPENCAGE_BASE_URL")
                .unwrap_or_else(|_| "https://api.opencagedata.com".to_string()),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 60)?,
            dashboard_report_limit: parse_var("DASHBOARD_REPORT_LIMIT", 100)?,
            analytics_report_limit: parse_var("ANALYTICS_REPORT_LIMIT", 200)?,
            display_utc_offset_minutes: parse_var("DISPLAY_UTC_OFFSET_MINUTES", 330)?,
            submit_redirect_delay_ms: parse_var("SUBMIT_REDIRECT_DELAY_MS", 2000)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_base_url.is_empty() {
            return Err(ConfigError::InvalidEnvVar("BACKEND_BASE_URL".to_string(), "cannot be empty".to_string()));
        }

        if self.backend_app_id.is_empty() {
            return Err(ConfigError::InvalidEnvVar("BACKEND_APP_ID".to_string(), "cannot be empty".to_string()));
        }

        if self.llm_provider == LlmProvider::Gemini && self.gemini_api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }

        if self.dashboard_report_limit == 0 || self.analytics_report_limit == 0 {
            return Err(ConfigError::InvalidEnvVar("*_REPORT_LIMIT".to_string(), "must be positive".to_string()));
        }

        if self.display_offset().is_none() {
            return Err(ConfigError::InvalidEnvVar(
                "DISPLAY_UTC_OFFSET_MINUTES".to_string(),
                format!("{} is out of range", self.display_utc_offset_minutes),
            ));
        }

        Ok(())
    }

    /// The "local" time zone used for calendar-day aggregates and display.
    pub fn display_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.display_utc_offset_minutes.checked_mul(60)?)
    }

    pub fn display_tz(&self) -> FixedOffset {
        self.display_offset().unwrap_or_else(|| Utc.fix())
    }

    /// The list size the snapshot has to hold to serve every view.
    pub fn snapshot_limit(&self) -> usize {
        self.dashboard_report_limit.max(self.analytics_report_limit)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The configured geocoder key, unless it is absent or the placeholder.
    pub fn usable_geocoder_key(&self) -> Option<&str> {
        self.geocoder_api_key
            .as_deref()
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_GEOCODER_KEY)
    }

    #[cfg(test)]
    pub fn for_tests(backend_base_url: &str) -> Self {
        Config {
            port: 0,
            backend_base_url: backend_base_url.to_string(),
            backend_app_id: "coastal-test".to_string(),
            llm_provider: LlmProvider::Backend,
            gemini_api_key: None,
            gemini_model: "gemini-flash-latest".to_string(),
            gemini_base_url: backend_base_url.to_string(),
            geocoder_api_key: None,
            geocoder_base_url: backend_base_url.to_string(),
            http_timeout_secs: 5,
            dashboard_report_limit: 100,
            analytics_report_limit: 200,
            display_utc_offset_minutes: 330,
            submit_redirect_delay_ms: 2000,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let valid_config = Config::for_tests("http://127.0.0.1:9");
        assert!(valid_config.validate().is_ok());

        let mut missing_app = Config::for_tests("http://127.0.0.1:9");
        missing_app.backend_app_id = String::new();
        assert!(missing_app.validate().is_err());

        let mut gemini_without_key = Config::for_tests("http://127.0.0.1:9");
        gemini_without_key.llm_provider = LlmProvider::Gemini;
        assert!(matches!(
            gemini_without_key.validate(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        let mut bad_offset = Config::for_tests("http://127.0.0.1:9");
        bad_offset.display_utc_offset_minutes = 24 * 60;
        assert!(bad_offset.validate().is_err());
    }

    #[test]
    fn test_display_offset_defaults_to_ist() {
        let config = Config::for_tests("http://127.0.0.1:9");
        assert_eq!(config.display_tz().local_minus_utc(), 330 * 60);
        assert_eq!(config.snapshot_limit(), 200);
    }

    #[test]
    fn test_placeholder_geocoder_key_is_ignored() {
        let mut config = Config::for_tests("http://127.0.0.1:9");
        config.geocoder_api_key = Some(PLACEHOLDER_GEOCODER_KEY.to_string());
        assert_eq!(config.usable_geocoder_key(), None);
        config.geocoder_api_key = Some("abc123".to_string());
        assert_eq!(config.usable_geocoder_key(), Some("abc123"));
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("openai".parse::<LlmProvider>().is_err());
    }
}
