//! In-process stand-in for the managed backend, the LLM endpoints and the
//! geocoder, bound to an ephemeral local port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use coastal_common::models::Role;
use serde_json::{json, Value};

#[derive(Default)]
struct FakeState {
    reports: Mutex<Vec<Value>>,
    private_reports: Mutex<HashMap<String, Vec<Value>>>,
    users: Mutex<HashMap<String, Value>>,
    llm_response: Mutex<Option<Value>>,
    fail_upload_at: Mutex<Option<usize>>,
    fail_llm: AtomicBool,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    fail_geocode: AtomicBool,
    gemini_v1beta_missing: AtomicBool,
    uploads: AtomicUsize,
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<Value>>,
    prompts: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn report_json(id: &str, severity: &str, created: &str) -> Value {
        json!({
            "id": id,
            "hazard_type": "storm_surge",
            "severity": severity,
            "title": format!("Report {id}"),
            "description": "Sea water entering houses",
            "location_name": "Puri, Odisha",
            "latitude": 19.81,
            "longitude": 85.83,
            "status": "pending",
            "urgency_score": 6,
            "social_media_mentions": 0,
            "media_urls": [],
            "created_by": "citizen@example.in",
            "created_date": created
        })
    }

    pub fn with_reports(self, reports: Vec<Value>) -> Self {
        *self.state.reports.lock().unwrap() = reports;
        self
    }

    /// Reports only the holder of `token` can list.
    pub fn with_reports_for(self, token: &str, reports: Vec<Value>) -> Self {
        self.state
            .private_reports
            .lock()
            .unwrap()
            .insert(token.to_string(), reports);
        self
    }

    pub fn with_user(self, token: &str, role: Role) -> Self {
        self.state.users.lock().unwrap().insert(
            token.to_string(),
            json!({
                "id": format!("user-{token}"),
                "full_name": "Asha Nair",
                "email": "asha@example.in",
                "role": role.as_str()
            }),
        );
        self
    }

    pub fn with_llm_response(self, response: Value) -> Self {
        *self.state.llm_response.lock().unwrap() = Some(response);
        self
    }

    /// Upload number `n` (1-based) answers with a server error.
    pub fn failing_upload_at(self, n: usize) -> Self {
        *self.state.fail_upload_at.lock().unwrap() = Some(n);
        self
    }

    pub fn failing_llm(self) -> Self {
        self.state.fail_llm.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_list(self) -> Self {
        self.state.fail_list.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_create(self) -> Self {
        self.state.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_geocode(self) -> Self {
        self.state.fail_geocode.store(true, Ordering::SeqCst);
        self
    }

    pub fn without_gemini_v1beta(self) -> Self {
        self.state.gemini_v1beta_missing.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<Value> {
        self.state.created.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.state.calls.lock().unwrap().push(call);
    }

    /// The registered user behind the request's bearer token.
    fn caller(&self, headers: &HeaderMap) -> Result<(String, Value), StatusCode> {
        let token = bearer(headers).ok_or(StatusCode::UNAUTHORIZED)?;
        let user = self
            .state
            .users
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)?;
        Ok((token, user))
    }

    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/apps/{app_id}/entities/HazardReport", get(list_reports).post(create_report))
            .route("/api/apps/{app_id}/entities/User/me", get(me))
            .route("/api/apps/{app_id}/auth/logout", post(logout))
            .route("/api/apps/{app_id}/integrations/Core/UploadFile", post(upload_file))
            .route("/api/apps/{app_id}/integrations/Core/InvokeLLM", post(invoke_llm))
            .route("/v1beta/models/{method}", post(gemini_v1beta))
            .route("/v1/models/{method}", post(gemini_v1))
            .route("/geocode/v1/json", get(geocode))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn list_reports(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let sort = params.get("sort").cloned().unwrap_or_default();
    let limit = params.get("limit").cloned().unwrap_or_default();
    fake.record(format!("list sort={sort} limit={limit}"));
    let (token, _) = fake.caller(&headers)?;
    if fake.state.fail_list.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let limit: usize = limit.parse().unwrap_or(usize::MAX);
    let private = fake
        .state
        .private_reports
        .lock()
        .unwrap()
        .get(&token)
        .cloned()
        .unwrap_or_default();
    let reports: Vec<Value> = fake
        .state
        .reports
        .lock()
        .unwrap()
        .iter()
        .cloned()
        .chain(private)
        .take(limit)
        .collect();
    Ok(Json(Value::Array(reports)))
}

async fn create_report(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    fake.record("create".to_string());
    let (_, user) = fake.caller(&headers)?;
    if fake.state.fail_create.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut record = body.clone();
    let n = fake.state.created.lock().unwrap().len() + 1;
    if let Some(obj) = record.as_object_mut() {
        obj.insert("id".to_string(), json!(format!("new-{n}")));
        obj.insert("created_by".to_string(), user["email"].clone());
        obj.insert("created_date".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    }
    fake.state.created.lock().unwrap().push(body);
    Ok(Json(record))
}

async fn me(State(fake): State<FakeBackend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    fake.record("me".to_string());
    fake.caller(&headers).map(|(_, user)| Json(user))
}

async fn logout(State(fake): State<FakeBackend>) -> StatusCode {
    fake.record("logout".to_string());
    StatusCode::OK
}

async fn upload_file(State(fake): State<FakeBackend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let n = fake.state.uploads.fetch_add(1, Ordering::SeqCst) + 1;
    fake.record(format!("upload {n}"));
    fake.caller(&headers)?;
    if *fake.state.fail_upload_at.lock().unwrap() == Some(n) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({ "file_url": format!("https://files.example/{n}") })))
}

async fn invoke_llm(
    State(fake): State<FakeBackend>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    fake.record("invoke_llm".to_string());
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    fake.state.prompts.lock().unwrap().push(prompt);
    if body.get("response_json_schema").is_none() || fake.state.fail_llm.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let response = fake.state.llm_response.lock().unwrap().clone();
    response.map(Json).ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn gemini_reply(fake: &FakeBackend, body: &Value) -> Result<Json<Value>, StatusCode> {
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    fake.state.prompts.lock().unwrap().push(prompt);
    if fake.state.fail_llm.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let text = fake
        .state
        .llm_response
        .lock()
        .unwrap()
        .clone()
        .unwrap_or(Value::Null)
        .to_string();
    Ok(Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": format!("```json\n{text}\n```") }] } }]
    })))
}

/// The key travels in `x-goog-api-key`; a key in the query string is refused.
fn gemini_key_check(headers: &HeaderMap, params: &HashMap<String, String>) -> Result<(), StatusCode> {
    if params.contains_key("key") {
        return Err(StatusCode::BAD_REQUEST);
    }
    match headers.get("x-goog-api-key") {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(StatusCode::FORBIDDEN),
    }
}

async fn gemini_v1beta(
    State(fake): State<FakeBackend>,
    Path(method): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    fake.record(format!("gemini v1beta {method}"));
    gemini_key_check(&headers, &params)?;
    if fake.state.gemini_v1beta_missing.load(Ordering::SeqCst) {
        return Err(StatusCode::NOT_FOUND);
    }
    gemini_reply(&fake, &body)
}

async fn gemini_v1(
    State(fake): State<FakeBackend>,
    Path(method): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    fake.record(format!("gemini v1 {method}"));
    gemini_key_check(&headers, &params)?;
    gemini_reply(&fake, &body)
}

async fn geocode(
    State(fake): State<FakeBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    fake.record(format!("geocode q={}", params.get("q").cloned().unwrap_or_default()));
    if fake.state.fail_geocode.load(Ordering::SeqCst) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "results": [{ "formatted": "Kovalam Beach, Thiruvananthapuram, Kerala, India" }]
    })))
}
