pub mod poller;
pub mod rest;
pub mod row;
pub mod sqlite;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{Booking, BookingStatus, Invoice};

pub use poller::spawn_poller;
pub use rest::RestGateway;
pub use row::{BookingRow, DecodeError};
pub use sqlite::SqliteGateway;

pub const BOOKINGS_TABLE: &str = "bookings";
pub const INVOICES_TABLE: &str = "invoices";

/// Access to the hosted bookings and invoices tables. Implementations publish
/// `RemoteChanged` after their own writes.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rows that fail to decode are logged and left out.
    async fn select(&self, statuses: Option<&[BookingStatus]>) -> AppResult<Vec<Booking>>;

    async fn get(&self, id: &str) -> AppResult<Option<Booking>>;

    /// Fails with `NotFound` when no row has the booking's id.
    async fn update(&self, booking: &Booking) -> AppResult<()>;

    async fn insert(&self, booking: &Booking) -> AppResult<()>;

    async fn select_invoices(&self) -> AppResult<Vec<Invoice>>;

    async fn mark_invoice_paid(&self, id: &str) -> AppResult<()>;
}

pub(crate) fn decode_rows(rows: Vec<BookingRow>) -> Vec<Booking> {
    rows.into_iter()
        .filter_map(|row| match Booking::try_from(row) {
            Ok(booking) => Some(booking),
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable booking row");
                None
            }
        })
        .collect()
}
