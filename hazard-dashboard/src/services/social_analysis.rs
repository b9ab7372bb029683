//! Simulated social-media analysis of the most recent reports. The LLM makes
//! the numbers up; this module only frames the prompt and keeps the last
//! answer around.

use chrono::{DateTime, Utc};
use coastal_common::models::HazardReport;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::{LlmClient, Session};
use crate::error::AppError;
use crate::services::reports;

pub const RECENT_REPORTS_IN_PROMPT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MisinformationRisk {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SentimentBreakdown {
    pub concerned: f64,
    pub neutral: f64,
    pub panic: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GeographicHotspot {
    pub location: String,
    pub mention_count: f64,
    pub sentiment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EngagementMetrics {
    pub total_posts: f64,
    pub total_reach: f64,
    pub avg_engagement_rate: f64,
}

/// Whatever the model returned, with missing parts defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SocialAnalysis {
    pub trending_keywords: Vec<String>,
    pub sentiment_breakdown: SentimentBreakdown,
    pub geographic_hotspots: Vec<GeographicHotspot>,
    pub engagement_metrics: EngagementMetrics,
    #[serde(deserialize_with = "lenient_risk")]
    pub misinformation_risk: Option<MisinformationRisk>,
}

fn lenient_risk<'de, D>(deserializer: D) -> Result<Option<MisinformationRisk>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| match s.trim().to_lowercase().as_str() {
            "low" => Some(MisinformationRisk::Low),
            "moderate" | "medium" => Some(MisinformationRisk::Moderate),
            "high" => Some(MisinformationRisk::High),
            _ => None,
        }))
}

/// The last analysis the service produced, served until the next run.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SocialAnalysisCache {
    pub analysis: Option<SocialAnalysis>,
    pub generated_at: Option<DateTime<Utc>>,
    pub reports_considered: usize,
    pub last_error: Option<String>,
}

pub fn report_line(report: &HazardReport) -> String {
    format!(
        "{}: {} at {} ({})",
        report.hazard_type,
        report.title,
        report.location_name.as_deref().unwrap_or("unknown location"),
        report.severity
    )
}

pub fn analysis_prompt(reports: &[HazardReport]) -> String {
    let recent = reports
        .iter()
        .take(RECENT_REPORTS_IN_PROMPT)
        .map(report_line)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analyze these recent coastal hazard reports and simulate what social media analysis might show:\n\n\
         Recent reports:\n{recent}\n\n\
         Simulate realistic social media analysis including:\n\
         1. Trending hazard keywords and hashtags\n\
         2. Sentiment analysis of public reactions\n\
         3. Geographic hotspots of social media activity\n\
         4. Estimated reach and engagement metrics\n\
         5. Key influencer mentions and emergency response accounts\n\
         6. Public concern levels and misinformation risks\n\n\
         Make it realistic for India's coastal regions and current social media patterns."
    )
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "trending_keywords": { "type": "array", "items": { "type": "string" } },
            "sentiment_breakdown": {
                "type": "object",
                "properties": {
                    "concerned": { "type": "number" },
                    "neutral": { "type": "number" },
                    "panic": { "type": "number" }
                }
            },
            "geographic_hotspots": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "location": { "type": "string" },
                        "mention_count": { "type": "number" },
                        "sentiment": { "type": "string" }
                    }
                }
            },
            "engagement_metrics": {
                "type": "object",
                "properties": {
                    "total_posts": { "type": "number" },
                    "total_reach": { "type": "number" },
                    "avg_engagement_rate": { "type": "number" }
                }
            },
            "misinformation_risk": { "type": "string", "enum": ["low", "moderate", "high"] }
        }
    })
}

pub async fn analyze(
    llm: &LlmClient,
    session: &Session,
    reports: &[HazardReport],
) -> Result<SocialAnalysis, AppError> {
    llm.invoke_as::<SocialAnalysis>(session, &analysis_prompt(reports), &analysis_schema())
        .await
        .map_err(AppError::Inference)
}

/// The last analysis run for this session.
pub fn cached(state: &AppState, session: &Session) -> SocialAnalysisCache {
    session
        .token()
        .and_then(|token| state.social.get(token))
        .unwrap_or_default()
}

/// Runs a fresh analysis over the session's newest reports. A failure keeps
/// the previous analysis and records a generic error next to it.
pub async fn run(state: &AppState, session: &Session) -> SocialAnalysisCache {
    let recent = reports::current_reports(state, session, state.config.analytics_report_limit).await;
    let considered = recent.len().min(RECENT_REPORTS_IN_PROMPT);
    let result = analyze(&state.llm, session, &recent).await;

    let apply = |cache: &mut SocialAnalysisCache| {
        match result {
            Ok(analysis) => {
                info!("social analysis generated from {} reports", considered);
                cache.analysis = Some(analysis);
                cache.generated_at = Some(Utc::now());
                cache.reports_considered = considered;
                cache.last_error = None;
            }
            Err(e) => {
                warn!("Error running social media analysis: {}", e);
                cache.last_error = Some(e.public_message());
            }
        }
        cache.clone()
    };
    match session.token() {
        Some(token) => state.social.update(token, apply),
        None => apply(&mut SocialAnalysisCache::default()),
    }
}
