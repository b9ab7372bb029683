use std::sync::Arc;

use crate::clients::{BackendClient, ClientError, Geocoder, LlmClient};
use crate::config::Config;
use crate::services::social_analysis::SocialAnalysisCache;
use crate::snapshot::{ReportSnapshot, SessionMap};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub llm: LlmClient,
    pub geocoder: Geocoder,
    pub snapshots: SessionMap<ReportSnapshot>,
    pub social: SessionMap<SocialAnalysisCache>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        Ok(Self {
            backend: BackendClient::new(&config)?,
            llm: LlmClient::new(&config)?,
            geocoder: Geocoder::new(&config)?,
            snapshots: SessionMap::default(),
            social: SessionMap::default(),
            config: Arc::new(config),
        })
    }

    /// Forgets everything cached for a session.
    pub fn evict(&self, token: &str) {
        self.snapshots.remove(token);
        self.social.remove(token);
    }
}
