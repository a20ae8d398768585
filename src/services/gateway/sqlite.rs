use async_trait::async_trait;

use super::{decode_rows, BookingGateway, BookingRow, BOOKINGS_TABLE, INVOICES_TABLE};
use crate::db::{self, queries, SharedConn};
use crate::errors::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::models::{Booking, BookingStatus, Invoice};

/// Gateway over a self-hosted SQLite copy of the bookings table.
pub struct SqliteGateway {
    conn: SharedConn,
    bus: EventBus,
}

impl SqliteGateway {
    pub fn new(conn: SharedConn, bus: EventBus) -> Self {
        Self { conn, bus }
    }

    pub fn insert_invoice(&self, invoice: &Invoice) -> AppResult<()> {
        {
            let conn = db::lock(&self.conn);
            queries::insert_invoice(&conn, invoice)?;
        }
        self.changed(INVOICES_TABLE);
        Ok(())
    }

    fn changed(&self, table: &str) {
        self.bus.publish(AppEvent::RemoteChanged {
            table: table.to_string(),
        });
    }
}

#[async_trait]
impl BookingGateway for SqliteGateway {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn select(&self, statuses: Option<&[BookingStatus]>) -> AppResult<Vec<Booking>> {
        let names: Option<Vec<&str>> = statuses.map(|list| list.iter().map(|s| s.as_str()).collect());
        let rows = {
            let conn = db::lock(&self.conn);
            queries::select_bookings(&conn, names.as_deref())?
        };
        Ok(decode_rows(rows))
    }

    async fn get(&self, id: &str) -> AppResult<Option<Booking>> {
        let row = {
            let conn = db::lock(&self.conn);
            queries::get_booking(&conn, id)?
        };
        Ok(row.map(Booking::try_from).transpose()?)
    }

    async fn update(&self, booking: &Booking) -> AppResult<()> {
        let updated = {
            let conn = db::lock(&self.conn);
            queries::update_booking(&conn, &BookingRow::from(booking))?
        };
        if !updated {
            return Err(AppError::NotFound(format!("booking {}", booking.id)));
        }
        self.changed(BOOKINGS_TABLE);
        Ok(())
    }

    async fn insert(&self, booking: &Booking) -> AppResult<()> {
        {
            let conn = db::lock(&self.conn);
            queries::insert_booking(&conn, &BookingRow::from(booking))?;
        }
        self.changed(BOOKINGS_TABLE);
        Ok(())
    }

    async fn select_invoices(&self) -> AppResult<Vec<Invoice>> {
        let conn = db::lock(&self.conn);
        Ok(queries::list_invoices(&conn)?)
    }

    async fn mark_invoice_paid(&self, id: &str) -> AppResult<()> {
        let updated = {
            let conn = db::lock(&self.conn);
            queries::set_invoice_paid(&conn, id)?
        };
        if !updated {
            return Err(AppError::NotFound(format!("invoice {id}")));
        }
        self.changed(INVOICES_TABLE);
        Ok(())
    }
}
