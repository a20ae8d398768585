use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::errors::{AppError, AppResult};
use crate::models::datetime::format_hhmm;
use crate::models::Booking;
use crate::services::bookings;
use crate::services::scheduling::{self, StaffConflict};
use crate::state::AppState;

// GET /api/planner?date=2024-06-01
#[derive(Deserialize)]
pub struct PlannerQuery {
    pub date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerEntry {
    pub booking: Booking,
    pub start: String,
    pub end: String,
    pub conflicts: Vec<StaffConflict>,
}

pub fn plan_for(bookings: &[Booking], day: NaiveDate, default_minutes: u32) -> Vec<PlannerEntry> {
    scheduling::bookings_on(bookings, day)
        .into_iter()
        .map(|b| PlannerEntry {
            booking: b.clone(),
            start: format_hhmm(&b.start()),
            end: format_hhmm(&scheduling::booking_end(b, default_minutes)),
            conflicts: scheduling::staff_conflicts(bookings, b, default_minutes),
        })
        .collect()
}

pub async fn day_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PlannerQuery>,
) -> AppResult<Json<Vec<PlannerEntry>>> {
    check_auth(&headers, &state.config.admin_token)?;

    let day = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {}", query.date)))?;
    let all = bookings::list_local(&state.store, None);
    Ok(Json(plan_for(&all, day, state.config.default_job_minutes)))
}
