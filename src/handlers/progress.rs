use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::errors::{AppError, AppResult};
use crate::models::{datetime, ServiceProgress};
use crate::services::progress::{self, NewTask};
use crate::state::AppState;

// GET /api/bookings/:id/progress
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<ServiceProgress>> {
    check_auth(&headers, &state.config.admin_token)?;

    progress::get(&state.store, &id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("progress for booking {id}")))
}

// PUT /api/bookings/:id/progress
#[derive(Deserialize)]
pub struct StartRequest {
    pub tasks: Vec<NewTask>,
}

pub async fn start_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<StartRequest>,
) -> AppResult<Json<ServiceProgress>> {
    check_auth(&headers, &state.config.admin_token)?;

    let started = progress::start(&state.store, &state.bus, &id, req.tasks, datetime::now())?;
    Ok(Json(started))
}

// POST /api/bookings/:id/progress/tasks/:task_id/complete
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub actual_minutes: Option<u32>,
}

pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, task_id)): Path<(String, String)>,
    body: Option<Json<CompleteRequest>>,
) -> AppResult<Json<ServiceProgress>> {
    check_auth(&headers, &state.config.admin_token)?;

    let req = body.map(|Json(r)| r).unwrap_or_default();
    let updated = progress::complete_task(
        &state.store,
        &state.bus,
        &id,
        &task_id,
        req.actual_minutes,
        datetime::now(),
    )?;
    Ok(Json(updated))
}
