use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::json;

use super::{decode_rows, BookingGateway, BookingRow, BOOKINGS_TABLE, INVOICES_TABLE};
use crate::errors::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::models::{Booking, BookingStatus, Invoice};

/// Gateway for a hosted PostgREST-style endpoint (`/rest/v1/<table>`).
pub struct RestGateway {
    base_url: String,
    client: reqwest::Client,
    bus: EventBus,
}

fn remote(context: &str) -> impl Fn(reqwest::Error) -> AppError + '_ {
    move |e| AppError::Remote(format!("{context}: {e}"))
}

/// Query string selecting rows by status, e.g. `status=in.(pending,confirmed)`.
pub fn status_filter(statuses: Option<&[BookingStatus]>) -> Option<String> {
    let list = statuses.filter(|s| !s.is_empty())?;
    let joined = list.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
    Some(format!("in.({joined})"))
}

impl RestGateway {
    pub fn new(base_url: &str, api_key: &str, bus: EventBus) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| AppError::Config("REMOTE_API_KEY contains invalid characters".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| AppError::Config("REMOTE_API_KEY contains invalid characters".to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            bus,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    async fn fetch_rows(&self, query: &[(&str, String)]) -> AppResult<Vec<BookingRow>> {
        self.client
            .get(self.table_url(BOOKINGS_TABLE))
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await
            .map_err(remote("failed to query bookings"))?
            .error_for_status()
            .map_err(remote("bookings query rejected"))?
            .json()
            .await
            .map_err(remote("failed to parse bookings response"))
    }
}

#[async_trait]
impl BookingGateway for RestGateway {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn select(&self, statuses: Option<&[BookingStatus]>) -> AppResult<Vec<Booking>> {
        let mut query = vec![("order", "date.asc,time.asc".to_string())];
        if let Some(filter) = status_filter(statuses) {
            query.push(("status", filter));
        }
        Ok(decode_rows(self.fetch_rows(&query).await?))
    }

    async fn get(&self, id: &str) -> AppResult<Option<Booking>> {
        let rows = self.fetch_rows(&[("id", format!("eq.{id}"))]).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Booking::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, booking: &Booking) -> AppResult<()> {
        let updated: Vec<BookingRow> = self
            .client
            .patch(self.table_url(BOOKINGS_TABLE))
            .query(&[("id", format!("eq.{}", booking.id))])
            .header("Prefer", "return=representation")
            .json(&BookingRow::from(booking))
            .send()
            .await
            .map_err(remote("failed to update booking"))?
            .error_for_status()
            .map_err(remote("booking update rejected"))?
            .json()
            .await
            .map_err(remote("failed to parse update response"))?;

        if updated.is_empty() {
            return Err(AppError::NotFound(format!("booking {}", booking.id)));
        }
        self.bus.publish(AppEvent::RemoteChanged {
            table: BOOKINGS_TABLE.to_string(),
        });
        Ok(())
    }

    async fn insert(&self, booking: &Booking) -> AppResult<()> {
        self.client
            .post(self.table_url(BOOKINGS_TABLE))
            .json(&BookingRow::from(booking))
            .send()
            .await
            .map_err(remote("failed to insert booking"))?
            .error_for_status()
            .map_err(remote("booking insert rejected"))?;

        self.bus.publish(AppEvent::RemoteChanged {
            table: BOOKINGS_TABLE.to_string(),
        });
        Ok(())
    }

    async fn select_invoices(&self) -> AppResult<Vec<Invoice>> {
        self.client
            .get(self.table_url(INVOICES_TABLE))
            .query(&[("select", "id,booking_id,amount,paid")])
            .send()
            .await
            .map_err(remote("failed to query invoices"))?
            .error_for_status()
            .map_err(remote("invoice query rejected"))?
            .json()
            .await
            .map_err(remote("failed to parse invoices response"))
    }

    async fn mark_invoice_paid(&self, id: &str) -> AppResult<()> {
        let updated: Vec<Invoice> = self
            .client
            .patch(self.table_url(INVOICES_TABLE))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "paid": true }))
            .send()
            .await
            .map_err(remote("failed to update invoice"))?
            .error_for_status()
            .map_err(remote("invoice update rejected"))?
            .json()
            .await
            .map_err(remote("failed to parse invoice response"))?;

        if updated.is_empty() {
            return Err(AppError::NotFound(format!("invoice {id}")));
        }
        self.bus.publish(AppEvent::RemoteChanged {
            table: INVOICES_TABLE.to_string(),
        });
        Ok(())
    }
}
