use coastal_common::models::{normalize_urgency, HazardType, Severity, DEFAULT_URGENCY_SCORE};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::clients::{LlmClient, Session};

pub fn urgency_prompt(description: &str, hazard_type: HazardType, severity: Severity) -> String {
    format!(
        "Analyze this coastal hazard report and calculate an urgency score from 1-10 based on:\n\
         - Description: \"{description}\"\n\
         - Hazard type: {hazard_type}\n\
         - Reported severity: {severity}\n\n\
         Consider factors like immediate danger to people, infrastructure impact, environmental damage, \
         and time sensitivity. Return only a number between 1-10."
    )
}

pub fn urgency_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "urgency_score": { "type": "number", "minimum": 1, "maximum": 10 },
            "reasoning": { "type": "string" }
        }
    })
}

/// Reads `urgency_score` out of an LLM answer, if it holds a usable number.
pub fn score_from_response(response: &Value) -> Option<u8> {
    response
        .get("urgency_score")
        .and_then(Value::as_f64)
        .and_then(normalize_urgency)
}

/// Scores a report 1-10. Never fails: any problem yields the default score.
pub async fn score(
    llm: &LlmClient,
    session: &Session,
    description: &str,
    hazard_type: HazardType,
    severity: Severity,
) -> u8 {
    let prompt = urgency_prompt(description, hazard_type, severity);
    match llm.invoke(session, &prompt, &urgency_schema()).await {
        Ok(response) => match score_from_response(&response) {
            Some(score) => {
                debug!("urgency score {} ({})", score, response["reasoning"].as_str().unwrap_or(""));
                score
            }
            None => {
                warn!("urgency response had no usable score, using {}", DEFAULT_URGENCY_SCORE);
                DEFAULT_URGENCY_SCORE
            }
        },
        Err(e) => {
            warn!("urgency scoring failed, using {}: {}", DEFAULT_URGENCY_SCORE, e);
            DEFAULT_URGENCY_SCORE
        }
    }
}
