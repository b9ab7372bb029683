//! Citizen report submission: validate, upload media, score urgency, create.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use coastal_common::models::{HazardReport, HazardType, NewHazardReport, ReportStatus, Severity};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::clients::{ClientError, MediaFile, Session};
use crate::error::AppError;
use crate::services::{reports, urgency};

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SUBMITTED_MESSAGE: &str =
    "Your hazard report has been submitted and will be reviewed by authorities.";

/// The submit form as the caller filled it in.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReportDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hazard_type: String,
    /// low, moderate, high or critical; moderate when left empty
    #[serde(default)]
    pub severity: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaUpload>,
}

/// An attachment, base64 encoded. A `data:` URL prefix is accepted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MediaUpload {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub data_base64: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SubmissionPhase {
    Editing,
    UploadingMedia { uploaded: usize, total: usize },
    Scoring,
    Creating,
    Success,
    Error { message: String },
}

impl SubmissionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionPhase::Editing => "editing",
            SubmissionPhase::UploadingMedia { .. } => "uploading_media",
            SubmissionPhase::Scoring => "scoring",
            SubmissionPhase::Creating => "creating",
            SubmissionPhase::Success => "success",
            SubmissionPhase::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    pub report: HazardReport,
    pub phases: Vec<SubmissionPhase>,
    pub message: String,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

/// A submission that stopped short of creating the report. `phases` ends
/// with the `error` phase; the form goes back to editing.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SubmissionFailure {
    pub error: AppError,
    pub phases: Vec<SubmissionPhase>,
}

impl SubmissionFailure {
    /// A failure before the form left the editing phase.
    pub fn before_start(error: AppError) -> Self {
        PhaseLog::new().fail(error)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    pub phases: Vec<SubmissionPhase>,
}

impl IntoResponse for SubmissionFailure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let fields = match &self.error {
            AppError::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        let body = SubmissionErrorResponse {
            error: self.error.public_message(),
            fields,
            phases: self.phases,
        };
        (status, Json(body)).into_response()
    }
}

/// A draft that passed validation, ready for the network steps.
#[derive(Debug, Clone)]
pub struct ValidatedDraft {
    pub title: String,
    pub description: String,
    pub hazard_type: HazardType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub media: Vec<MediaFile>,
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn decode_media(upload: &MediaUpload) -> Option<MediaFile> {
    let data = upload.data_base64.trim();
    let data = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload)?,
        None => data,
    };
    let bytes = STANDARD.decode(data).ok()?;
    Some(MediaFile {
        file_name: upload.file_name.clone(),
        content_type: upload.content_type.clone(),
        bytes,
    })
}

/// Checks the draft without touching the network. The error lists every
/// offending field.
pub fn validate(draft: &ReportDraft) -> Result<ValidatedDraft, AppError> {
    let mut invalid = Vec::new();

    if draft.title.trim().is_empty() {
        invalid.push("title".to_string());
    }
    if draft.description.trim().is_empty() {
        invalid.push("description".to_string());
    }
    let hazard_type = draft.hazard_type.trim().parse::<HazardType>().ok();
    if hazard_type.is_none() {
        invalid.push("hazard_type".to_string());
    }
    let severity = match draft.severity.trim() {
        "" => Some(Severity::default()),
        raw => raw.parse::<Severity>().ok(),
    };
    if severity.is_none() {
        invalid.push("severity".to_string());
    }
    let latitude = parse_coordinate(&draft.latitude);
    if latitude.is_none() {
        invalid.push("latitude".to_string());
    }
    let longitude = parse_coordinate(&draft.longitude);
    if longitude.is_none() {
        invalid.push("longitude".to_string());
    }
    let mut media = Vec::with_capacity(draft.media.len());
    for (i, upload) in draft.media.iter().enumerate() {
        match decode_media(upload) {
            Some(file) => media.push(file),
            None => invalid.push(format!("media[{i}]")),
        }
    }

    match (hazard_type, severity, latitude, longitude) {
        (Some(hazard_type), Some(severity), Some(latitude), Some(longitude)) if invalid.is_empty() => Ok(ValidatedDraft {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            hazard_type,
            severity,
            latitude,
            longitude,
            location_name: draft
                .location_name
                .as_ref()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            media,
        }),
        _ => Err(AppError::Validation(invalid)),
    }
}

struct PhaseLog {
    phases: Vec<SubmissionPhase>,
}

impl PhaseLog {
    fn new() -> Self {
        Self {
            phases: vec![SubmissionPhase::Editing],
        }
    }

    fn enter(&mut self, phase: SubmissionPhase) {
        info!("submission phase: {}", phase.name());
        self.phases.push(phase);
    }

    fn fail(mut self, err: AppError) -> SubmissionFailure {
        let from = self.phases.last().map(SubmissionPhase::name).unwrap_or("editing");
        if err.status().is_server_error() {
            error!("Error submitting report during {}: {}", from, err);
        } else {
            info!("submission rejected during {}: {}", from, err);
        }
        self.phases.push(SubmissionPhase::Error {
            message: err.public_message(),
        });
        SubmissionFailure {
            error: err,
            phases: self.phases,
        }
    }
}

fn step_error(e: ClientError, wrap: fn(ClientError) -> AppError) -> AppError {
    match e {
        ClientError::NotAuthenticated => AppError::AuthenticationRequired,
        other => wrap(other),
    }
}

pub async fn submit(
    state: &AppState,
    session: &Session,
    draft: ReportDraft,
) -> Result<SubmissionReceipt, SubmissionFailure> {
    let mut log = PhaseLog::new();
    let draft = match validate(&draft) {
        Ok(draft) => draft,
        Err(e) => return Err(log.fail(e)),
    };

    let total = draft.media.len();
    let mut media_urls = Vec::with_capacity(total);
    for file in &draft.media {
        log.enter(SubmissionPhase::UploadingMedia {
            uploaded: media_urls.len(),
            total,
        });
        match state.backend.upload_file(session, file).await {
            Ok(url) => media_urls.push(url),
            Err(e) => return Err(log.fail(step_error(e, AppError::Upload))),
        }
    }

    log.enter(SubmissionPhase::Scoring);
    let urgency_score = urgency::score(
        &state.llm,
        session,
        &draft.description,
        draft.hazard_type,
        draft.severity,
    )
    .await;

    log.enter(SubmissionPhase::Creating);
    let record = NewHazardReport {
        title: draft.title,
        description: draft.description,
        hazard_type: draft.hazard_type,
        severity: draft.severity,
        latitude: draft.latitude,
        longitude: draft.longitude,
        location_name: draft.location_name,
        media_urls,
        urgency_score,
        social_media_mentions: 0,
        status: ReportStatus::Pending,
    };
    let report = match state.backend.create_report(session, &record).await {
        Ok(report) => report,
        Err(e) => return Err(log.fail(step_error(e, AppError::Create))),
    };

    reports::mark_stale(state, session);
    log.enter(SubmissionPhase::Success);
    info!("report {} submitted with urgency {}", report.id, urgency_score);

    Ok(SubmissionReceipt {
        report,
        phases: log.phases,
        message: SUBMITTED_MESSAGE.to_string(),
        redirect_to: DASHBOARD_PATH.to_string(),
        redirect_after_ms: state.config.submit_redirect_delay_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::SUBMIT_FAILED_MESSAGE;
    use crate::test_support::FakeBackend;
    use coastal_common::models::Role;
    use serde_json::json;

    fn draft() -> ReportDraft {
        ReportDraft {
            title: "Sea water entering homes".to_string(),
            description: "Storm surge flooding the fishing hamlet".to_string(),
            hazard_type: "storm_surge".to_string(),
            latitude: "13.05".to_string(),
            longitude: "80.28".to_string(),
            location_name: Some("Marina Beach, Chennai".to_string()),
            ..ReportDraft::default()
        }
    }

    fn attachment(name: &str, bytes: &[u8]) -> MediaUpload {
        MediaUpload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data_base64: STANDARD.encode(bytes),
        }
    }

    #[test]
    fn test_validation_lists_missing_fields() {
        let mut d = draft();
        d.title = "  ".to_string();
        d.latitude = "north".to_string();
        d.hazard_type = "volcano".to_string();
        match validate(&d) {
            Err(AppError::Validation(fields)) => {
                assert_eq!(fields, vec!["title", "hazard_type", "latitude"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_non_finite_coordinates() {
        let mut d = draft();
        d.longitude = "NaN".to_string();
        assert!(matches!(validate(&d), Err(AppError::Validation(f)) if f == vec!["longitude"]));
    }

    #[test]
    fn test_draft_accepts_numeric_coordinates_and_data_urls() {
        let d: ReportDraft = serde_json::from_value(json!({
            "title": "t",
            "description": "d",
            "hazard_type": "erosion",
            "latitude": 15.5,
            "longitude": 73.8,
            "media": [{"file_name": "a.png", "data_base64": "data:image/png;base64,aGVsbG8="}]
        }))
        .unwrap();
        let valid = validate(&d).unwrap();
        assert_eq!(valid.severity, Severity::Moderate);
        assert_eq!(valid.latitude, 15.5);
        assert_eq!(valid.media[0].bytes, b"hello");
        assert_eq!(valid.location_name, None);
    }

    #[test]
    fn test_unknown_severity_is_a_field_error() {
        let mut d = draft();
        d.severity = "apocalyptic".to_string();
        assert!(matches!(validate(&d), Err(AppError::Validation(f)) if f == vec!["severity"]));

        d.severity = "critical".to_string();
        assert_eq!(validate(&d).unwrap().severity, Severity::Critical);
    }

    async fn signed_in_state(fake: &FakeBackend) -> AppState {
        let base = fake.spawn().await;
        AppState::new(Config::for_tests(&base)).unwrap()
    }

    fn citizen() -> Session {
        Session::with_token("citizen")
    }

    fn phase_names(phases: &[SubmissionPhase]) -> Vec<&'static str> {
        phases.iter().map(SubmissionPhase::name).collect()
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_requests() {
        let fake = FakeBackend::default().with_user("citizen", Role::Citizen);
        let state = signed_in_state(&fake).await;
        let mut d = draft();
        d.title = String::new();

        let failure = submit(&state, &citizen(), d).await.unwrap_err();
        assert!(matches!(failure.error, AppError::Validation(_)));
        assert_eq!(phase_names(&failure.phases), vec!["editing", "error"]);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_uploads_in_order_then_scores_and_creates() {
        let fake = FakeBackend::default()
            .with_user("citizen", Role::Citizen)
            .with_llm_response(json!({"urgency_score": 8, "reasoning": "r"}));
        let state = signed_in_state(&fake).await;
        state.snapshots.update("citizen", |snapshot| snapshot.replace(Vec::new()));
        let mut d = draft();
        d.media = vec![attachment("first.jpg", b"one"), attachment("second.jpg", b"two")];

        let receipt = submit(&state, &citizen(), d).await.unwrap();
        assert_eq!(fake.calls(), vec!["upload 1", "upload 2", "invoke_llm", "create"]);
        assert_eq!(
            receipt.report.media_urls,
            vec!["https://files.example/1", "https://files.example/2"]
        );
        assert_eq!(receipt.report.urgency_score, Some(8));
        assert_eq!(receipt.report.social_media_mentions, 0);
        assert_eq!(receipt.redirect_to, "/dashboard");
        assert_eq!(receipt.redirect_after_ms, 2000);
        assert_eq!(
            phase_names(&receipt.phases),
            vec!["editing", "uploading_media", "uploading_media", "scoring", "creating", "success"]
        );
        assert!(state.snapshots.get("citizen").unwrap().needs_load());

        let created = &fake.created()[0];
        assert_eq!(created["status"], "pending");
        assert_eq!(created["severity"], "moderate");
        assert_eq!(created["latitude"], 13.05);
    }

    #[tokio::test]
    async fn test_llm_failure_scores_five() {
        let fake = FakeBackend::default()
            .with_user("citizen", Role::Citizen)
            .failing_llm();
        let state = signed_in_state(&fake).await;

        let receipt = submit(&state, &citizen(), draft()).await.unwrap();
        assert_eq!(receipt.report.urgency_score, Some(5));
        assert_eq!(fake.created()[0]["urgency_score"], 5);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_before_create() {
        let fake = FakeBackend::default()
            .with_user("citizen", Role::Citizen)
            .failing_upload_at(2);
        let state = signed_in_state(&fake).await;
        let mut d = draft();
        d.media = vec![
            attachment("a.jpg", b"a"),
            attachment("b.jpg", b"b"),
            attachment("c.jpg", b"c"),
        ];

        let failure = submit(&state, &citizen(), d).await.unwrap_err();
        assert!(matches!(failure.error, AppError::Upload(_)));
        assert_eq!(failure.error.public_message(), SUBMIT_FAILED_MESSAGE);
        assert_eq!(
            phase_names(&failure.phases),
            vec!["editing", "uploading_media", "uploading_media", "error"]
        );
        assert_eq!(fake.calls(), vec!["upload 1", "upload 2"]);
        assert!(fake.created().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_uses_generic_message() {
        let fake = FakeBackend::default()
            .with_user("citizen", Role::Citizen)
            .failing_create();
        let state = signed_in_state(&fake).await;

        let failure = submit(&state, &citizen(), draft()).await.unwrap_err();
        assert!(matches!(failure.error, AppError::Create(_)));
        assert_eq!(
            failure.phases.last(),
            Some(&SubmissionPhase::Error {
                message: SUBMIT_FAILED_MESSAGE.to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_rejected_session_needs_sign_in() {
        let fake = FakeBackend::default();
        let state = signed_in_state(&fake).await;

        let failure = submit(&state, &Session::with_token("expired"), draft()).await.unwrap_err();
        assert!(matches!(failure.error, AppError::AuthenticationRequired));
        assert!(fake.created().is_empty());
    }
}
