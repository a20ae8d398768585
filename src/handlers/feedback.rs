use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppResult;
use crate::models::{datetime, Feedback, NewFeedback};
use crate::services::feedback;
use crate::state::AppState;

// GET /api/feedback?bookingId=...
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub booking_id: Option<String>,
}

pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FeedbackQuery>,
) -> AppResult<Json<Vec<Feedback>>> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(feedback::list(&state.store, query.booking_id.as_deref())))
}

// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<NewFeedback>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    check_auth(&headers, &state.config.admin_token)?;

    let saved = feedback::submit(&state.store, form, datetime::now())?;
    Ok((StatusCode::CREATED, Json(saved)))
}
