use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppResult;
use crate::models::{datetime, PhotoKind, PhotoRecord};
use crate::services::photos::{self, NewPhoto};
use crate::state::AppState;

// GET /api/bookings/:id/photos?type=before
#[derive(Deserialize)]
pub struct PhotoQuery {
    #[serde(rename = "type")]
    pub kind: Option<PhotoKind>,
}

pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> AppResult<Json<Vec<PhotoRecord>>> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(photos::for_booking(&state.store, &id, query.kind)))
}

// POST /api/bookings/:id/photos
pub async fn add_photo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(photo): Json<NewPhoto>,
) -> AppResult<(StatusCode, Json<PhotoRecord>)> {
    check_auth(&headers, &state.config.admin_token)?;

    let record = photos::add(&state.store, &id, photo, datetime::now())?;
    Ok((StatusCode::CREATED, Json(record)))
}

// DELETE /api/photos/:id
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    check_auth(&headers, &state.config.admin_token)?;

    photos::delete(&state.store, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
