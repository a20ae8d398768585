use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::check_auth;
use crate::errors::AppResult;
use crate::services::sync::{self, SyncReport};
use crate::state::AppState;

// POST /api/sync
pub async fn sync_now(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    check_auth(&headers, &state.config.admin_token)?;

    let report = sync::reconcile(&state.store, state.gateway.as_ref()).await?;
    Ok(Json(report))
}
