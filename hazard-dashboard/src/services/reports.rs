//! Report loads on behalf of a signed-in session. Each session has its own
//! snapshot; nothing loaded under one token is served to another.

use chrono::{DateTime, Utc};
use coastal_common::models::HazardReport;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::clients::backend::NEWEST_FIRST;
use crate::clients::Session;
use crate::error::AppError;

/// Fetches the newest reports and replaces the session's snapshot. Returns the count.
pub async fn refresh(state: &AppState, session: &Session) -> Result<usize, AppError> {
    let token = session.token().ok_or(AppError::AuthenticationRequired)?;
    let reports = state
        .backend
        .list_reports(session, NEWEST_FIRST, state.config.snapshot_limit())
        .await?;
    let count = reports.len();
    state.snapshots.update(token, |snapshot| snapshot.replace(reports));
    info!("report snapshot loaded: {} reports", count);
    Ok(count)
}

/// The newest `limit` reports, loading the session's snapshot first when it
/// is missing or stale. A failed load keeps whatever the snapshot held before.
pub async fn current_reports(state: &AppState, session: &Session, limit: usize) -> Vec<HazardReport> {
    let Some(token) = session.token() else {
        return Vec::new();
    };
    let needs_load = state
        .snapshots
        .get(token)
        .map_or(true, |snapshot| snapshot.needs_load());
    if needs_load {
        if let Err(e) = refresh(state, session).await {
            warn!("Error loading reports, keeping previous snapshot: {}", e);
        }
    }
    state
        .snapshots
        .get(token)
        .map(|snapshot| snapshot.reports(limit))
        .unwrap_or_default()
}

/// Forces the next read for this session to go back to the report store.
pub fn mark_stale(state: &AppState, session: &Session) {
    if let Some(token) = session.token() {
        state.snapshots.update(token, |snapshot| snapshot.mark_stale());
    }
}

pub fn loaded_at(state: &AppState, session: &Session) -> Option<DateTime<Utc>> {
    session
        .token()
        .and_then(|token| state.snapshots.get(token))
        .and_then(|snapshot| snapshot.loaded_at())
}
