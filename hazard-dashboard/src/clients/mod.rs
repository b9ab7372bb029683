//! HTTP facades over the external collaborators: the managed backend (report
//! store, user service, blob store), the LLM invocation service and the
//! reverse geocoder. They forward requests and decode responses, nothing more.

pub mod backend;
pub mod geocode;
pub mod llm;

pub use backend::{BackendClient, MediaFile, Session};
pub use geocode::Geocoder;
pub use llm::LlmClient;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Maps non-success statuses to `ClientError`, keeping the body for the log.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ClientError::NotAuthenticated);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
