use axum::http::{header::AUTHORIZATION, HeaderMap};
use coastal_common::models::{HazardReport, NewHazardReport, User};
use reqwest::multipart;
use serde::Deserialize;

use super::{check_status, ClientError};
use crate::config::Config;

/// Sort key for the report store: newest first.
pub const NEWEST_FIRST: &str = "-created_date";

/// The caller's credentials, forwarded to the backend as a bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_url: String,
}

/// Report store, user service and blob store of the managed backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_base_url.clone(),
            app_id: config.backend_app_id.clone(),
        })
    }

    fn app_url(&self, path: &str) -> String {
        format!("{}/api/apps/{}/{}", self.base_url, self.app_id, path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        match session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    // Report store

    pub async fn list_reports(
        &self,
        session: &Session,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<HazardReport>, ClientError> {
        let limit = limit.to_string();
        let req = self
            .http
            .get(self.app_url("entities/HazardReport"))
            .query(&[("sort", sort), ("limit", limit.as_str())]);
        let resp = check_status(self.authorized(req, session).send().await?).await?;
        resp.json::<Vec<HazardReport>>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn create_report(
        &self,
        session: &Session,
        record: &NewHazardReport,
    ) -> Result<HazardReport, ClientError> {
        let req = self
            .http
            .post(self.app_url("entities/HazardReport"))
            .json(record);
        let resp = check_status(self.authorized(req, session).send().await?).await?;
        resp.json::<HazardReport>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    // User service

    pub async fn me(&self, session: &Session) -> Result<User, ClientError> {
        if session.token().is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let req = self.http.get(self.app_url("entities/User/me"));
        let resp = check_status(self.authorized(req, session).send().await?).await?;
        resp.json::<User>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Where to send a browser to sign in; the backend redirects back to
    /// `return_to` afterwards.
    pub fn login_url(&self, return_to: &str) -> String {
        format!(
            "{}/login?from_url={}&app_id={}",
            self.base_url,
            urlencoding::encode(return_to),
            urlencoding::encode(&self.app_id)
        )
    }

    pub async fn logout(&self, session: &Session) -> Result<(), ClientError> {
        let req = self.http.post(self.app_url("auth/logout"));
        check_status(self.authorized(req, session).send().await?).await?;
        Ok(())
    }

    // Blob store

    pub async fn upload_file(&self, session: &Session, file: &MediaFile) -> Result<String, ClientError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);
        let req = self
            .http
            .post(self.app_url("integrations/Core/UploadFile"))
            .multipart(form);
        let resp = check_status(self.authorized(req, session).send().await?).await?;
        let body = resp
            .json::<UploadResponse>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(body.file_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;
    use axum::http::HeaderValue;
    use coastal_common::models::Role;

    #[test]
    fn test_session_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Session::from_headers(&headers), Session::anonymous());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(Session::from_headers(&headers).token(), Some("abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(Session::from_headers(&headers).token(), None);
    }

    #[test]
    fn test_login_url_encodes_return_path() {
        let config = Config::for_tests("https://backend.example");
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(
            client.login_url("https://app.example/dashboard?x=1"),
            "https://backend.example/login?from_url=https%3A%2F%2Fapp.example%2Fdashboard%3Fx%3D1&app_id=coastal-test"
        );
    }

    #[tokio::test]
    async fn test_list_reports_forwards_sort_and_limit() {
        let fake = FakeBackend::default()
            .with_user("t", Role::Official)
            .with_reports(vec![FakeBackend::report_json("r1", "high", "2026-10-16T05:00:00Z")]);
        let base = fake.spawn().await;
        let client = BackendClient::new(&Config::for_tests(&base)).unwrap();

        let reports = client
            .list_reports(&Session::with_token("t"), NEWEST_FIRST, 100)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(fake.calls(), vec!["list sort=-created_date limit=100"]);
    }

    #[tokio::test]
    async fn test_list_reports_without_session_is_refused() {
        let fake = FakeBackend::default()
            .with_reports(vec![FakeBackend::report_json("r1", "high", "2026-10-16T05:00:00Z")]);
        let base = fake.spawn().await;
        let client = BackendClient::new(&Config::for_tests(&base)).unwrap();

        let result = client.list_reports(&Session::anonymous(), NEWEST_FIRST, 100).await;
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_me_without_token_is_not_authenticated() {
        let fake = FakeBackend::default();
        let base = fake.spawn().await;
        let client = BackendClient::new(&Config::for_tests(&base)).unwrap();

        let result = client.me(&Session::anonymous()).await;
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_me_rejected_token() {
        let fake = FakeBackend::default();
        let base = fake.spawn().await;
        let client = BackendClient::new(&Config::for_tests(&base)).unwrap();

        let result = client.me(&Session::with_token("expired")).await;
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
    }
}
