use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::errors::{AppError, AppResult};
use crate::events::AppEvent;
use crate::state::AppState;

// GET /api/events?token=...&bookingId=...
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub token: Option<String>,
    pub booking_id: Option<String>,
}

/// Events without a booking id (notifications, storage and remote changes)
/// always pass the filter.
fn wanted(event: &AppEvent, booking_id: Option<&str>) -> bool {
    match (booking_id, event.booking_id()) {
        (Some(wanted), Some(id)) => wanted == id,
        _ => true,
    }
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token.is_empty() || token != state.config.admin_token {
        return Err(AppError::Unauthorized);
    }

    let booking_id = query.booking_id;
    let live_stream = BroadcastStream::new(state.bus.subscribe()).filter_map(move |result| match result {
        Ok(event) if wanted(&event, booking_id.as_deref()) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event(event.name())))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "event stream lagged");
            None
        }
    });

    let keepalive_stream = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Ok(Sse::new(live_stream.merge(keepalive_stream)))
}
