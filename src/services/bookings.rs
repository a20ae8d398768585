use crate::errors::{AppError, AppResult};
use crate::models::{datetime, Booking, BookingStatus, Bucket, NewBooking};
use crate::services::local_store::{LocalStore, StoreKey};

/// Validates an intake submission and appends it to the pending list.
pub fn submit(store: &LocalStore, form: NewBooking) -> AppResult<Booking> {
    let booking = form
        .into_booking(uuid::Uuid::new_v4().to_string(), datetime::now())
        .map_err(AppError::Validation)?;

    let mut pending: Vec<Booking> = store.read_all(StoreKey::PendingBookings);
    pending.push(booking.clone());
    store.write_all(StoreKey::PendingBookings, &pending)?;

    tracing::info!(booking_id = %booking.id, customer = %booking.customer, "booking submitted");
    Ok(booking)
}

/// Every booking in both local lists, optionally restricted to `statuses`.
pub fn list_local(store: &LocalStore, statuses: Option<&[BookingStatus]>) -> Vec<Booking> {
    let mut all: Vec<Booking> = store.read_all(StoreKey::PendingBookings);
    all.extend(store.read_all::<Booking>(StoreKey::ConfirmedBookings));
    if let Some(wanted) = statuses.filter(|s| !s.is_empty()) {
        all.retain(|b| wanted.contains(&b.status));
    }
    all.sort_by_key(|b| b.date);
    all
}

pub fn find_local(store: &LocalStore, id: &str) -> Option<(Bucket, Booking)> {
    [Bucket::Pending, Bucket::Confirmed].into_iter().find_map(|bucket| {
        store
            .read_all::<Booking>(StoreKey::from(bucket))
            .into_iter()
            .find(|b| b.id == id)
            .map(|b| (bucket, b))
    })
}

/// Removes the booking from `from` and appends it to `to`. The two writes are
/// independent; a failure between them leaves the booking in neither list.
pub fn move_between(store: &LocalStore, id: &str, from: Bucket, to: Bucket) -> AppResult<Booking> {
    let mut source: Vec<Booking> = store.read_all(StoreKey::from(from));
    let pos = source
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| AppError::NotFound(format!("booking {id} in {from:?} list")))?;
    let booking = source.remove(pos);
    store.write_all(StoreKey::from(from), &source)?;

    let mut target: Vec<Booking> = store.read_all(StoreKey::from(to));
    target.push(booking.clone());
    store.write_all(StoreKey::from(to), &target)?;

    tracing::debug!(booking_id = %id, ?from, ?to, "moved booking between local lists");
    Ok(booking)
}
