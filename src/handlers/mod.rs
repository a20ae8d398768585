pub mod bookings;
pub mod calendar;
pub mod events;
pub mod feedback;
pub mod health;
pub mod invoices;
pub mod photos;
pub mod planner;
pub mod progress;
pub mod sync;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> AppResult<()> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/status", post(bookings::update_status))
        .route("/api/bookings/:id/confirm", post(bookings::confirm_booking))
        .route("/api/planner", get(planner::day_plan))
        .route(
            "/api/bookings/:id/progress",
            get(progress::get_progress).put(progress::start_progress),
        )
        .route(
            "/api/bookings/:id/progress/tasks/:task_id/complete",
            post(progress::complete_task),
        )
        .route(
            "/api/bookings/:id/photos",
            get(photos::list_photos).post(photos::add_photo),
        )
        .route("/api/photos/:id", delete(photos::delete_photo))
        .route("/api/invoices", get(invoices::list_invoices))
        .route("/api/invoices/:id/paid", post(invoices::mark_paid))
        .route(
            "/api/feedback",
            get(feedback::list_feedback).post(feedback::submit_feedback),
        )
        .route("/api/sync", post(sync::sync_now))
        .route("/api/events", get(events::events_stream))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_check_auth() {
        assert!(check_auth(&headers("Bearer secret"), "secret").is_ok());
        assert!(check_auth(&headers("Bearer nope"), "secret").is_err());
        assert!(check_auth(&headers("secret"), "secret").is_err());
        assert!(check_auth(&HeaderMap::new(), "").is_err());
    }
}
