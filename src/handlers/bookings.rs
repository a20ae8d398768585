use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, Bucket, NewBooking};
use crate::services::bookings;
use crate::services::transition::{Placement, TransitionOutcome};
use crate::state::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Local,
    Remote,
}

// GET /api/bookings?status=pending,confirmed&source=remote
#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub source: Source,
}

fn parse_statuses(raw: Option<&str>) -> AppResult<Vec<BookingStatus>> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<BookingStatus>().map_err(|e| AppError::Validation(format!("{e}"))))
        .collect()
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    check_auth(&headers, &state.config.admin_token)?;

    let statuses = parse_statuses(query.status.as_deref())?;
    let filter = (!statuses.is_empty()).then_some(statuses.as_slice());
    let bookings = match query.source {
        Source::Local => bookings::list_local(&state.store, filter),
        Source::Remote => state.gateway.select(filter).await?,
    };
    Ok(Json(bookings))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<NewBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = bookings::submit(&state.store, form)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Local copy first, then the remote table.
async fn load(state: &AppState, id: &str) -> AppResult<Booking> {
    if let Some((_, booking)) = bookings::find_local(&state.store, id) {
        return Ok(booking);
    }
    state
        .gateway
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(load(&state, &id).await?))
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub placement: Placement,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<Json<TransitionOutcome>> {
    check_auth(&headers, &state.config.admin_token)?;

    let target: BookingStatus = req
        .status
        .parse()
        .map_err(|e| AppError::Validation(format!("{e}")))?;

    let booking = match req.placement {
        Placement::Remote => state
            .gateway
            .get(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?,
        _ => bookings::find_local(&state.store, &id)
            .map(|(_, b)| b)
            .ok_or_else(|| AppError::NotFound(format!("booking {id} in local store")))?,
    };

    let outcome = state.transition.apply(&booking, target, req.placement).await?;
    Ok(Json(outcome))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<TransitionOutcome>> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = bookings::move_between(&state.store, &id, Bucket::Pending, Bucket::Confirmed)?;
    let outcome = state
        .transition
        .apply(&booking, BookingStatus::Confirmed, Placement::Both)
        .await?;
    Ok(Json(outcome))
}
