use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::errors::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::models::{Feedback, Invoice, NewFeedback};
use crate::services::bookings;
use crate::services::gateway::BookingGateway;
use crate::services::local_store::{LocalStore, StoreKey};
use crate::services::messaging::MessagingProvider;

// ── Invoice watching ──

/// Remembers which invoices have been seen paid. After priming, an invoice
/// counts as newly paid the first time it is observed with `paid = true`.
#[derive(Default)]
pub struct InvoiceWatcher {
    paid: Mutex<HashSet<String>>,
    primed: Mutex<bool>,
}

impl InvoiceWatcher {
    pub fn observe(&self, invoices: &[Invoice]) -> Vec<Invoice> {
        let mut paid = self.paid.lock().unwrap_or_else(|e| e.into_inner());
        let mut primed = self.primed.lock().unwrap_or_else(|e| e.into_inner());

        let mut newly_paid = vec![];
        for invoice in invoices.iter().filter(|i| i.paid) {
            if paid.insert(invoice.id.clone()) && *primed {
                newly_paid.push(invoice.clone());
            }
        }
        *primed = true;
        newly_paid
    }
}

pub struct FeedbackRequester {
    store: LocalStore,
    gateway: Arc<dyn BookingGateway>,
    messaging: Arc<dyn MessagingProvider>,
    bus: EventBus,
    business_name: String,
    watcher: InvoiceWatcher,
}

impl FeedbackRequester {
    pub fn new(
        store: LocalStore,
        gateway: Arc<dyn BookingGateway>,
        messaging: Arc<dyn MessagingProvider>,
        bus: EventBus,
        business_name: String,
    ) -> Self {
        Self {
            store,
            gateway,
            messaging,
            bus,
            business_name,
            watcher: InvoiceWatcher::default(),
        }
    }

    /// Re-fetches invoices and requests feedback for each one that became paid.
    pub async fn check_invoices(&self) -> usize {
        let invoices = match self.gateway.select_invoices().await {
            Ok(invoices) => invoices,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch invoices");
                return 0;
            }
        };

        let newly_paid = self.watcher.observe(&invoices);
        for invoice in &newly_paid {
            self.request(invoice).await;
        }
        newly_paid.len()
    }

    async fn request(&self, invoice: &Invoice) {
        tracing::info!(invoice_id = %invoice.id, booking_id = %invoice.booking_id, "invoice paid, requesting feedback");
        self.bus.publish(AppEvent::FeedbackRequested {
            booking_id: invoice.booking_id.clone(),
            invoice_id: invoice.id.clone(),
        });

        let booking = match bookings::find_local(&self.store, &invoice.booking_id) {
            Some((_, booking)) => Some(booking),
            None => self.gateway.get(&invoice.booking_id).await.unwrap_or_else(|e| {
                tracing::warn!(booking_id = %invoice.booking_id, error = %e, "failed to load booking for feedback");
                None
            }),
        };

        let Some(phone) = booking.as_ref().and_then(|b| b.phone.as_deref()) else {
            tracing::debug!(booking_id = %invoice.booking_id, "no phone number, skipping feedback SMS");
            return;
        };

        let body = format!(
            "Thanks for choosing {}! How did we do? Reply with a rating from 1 to 5.",
            self.business_name
        );
        if let Err(e) = self.messaging.send_message(phone, &body).await {
            tracing::error!(booking_id = %invoice.booking_id, error = %e, "failed to send feedback request");
        }
    }
}

// ── Feedback records ──

pub fn submit(store: &LocalStore, form: NewFeedback, now: NaiveDateTime) -> AppResult<Feedback> {
    if form.booking_id.trim().is_empty() {
        return Err(AppError::Validation("bookingId is required".to_string()));
    }
    if !(1..=5).contains(&form.rating) {
        return Err(AppError::Validation(format!(
            "rating must be between 1 and 5, got {}",
            form.rating
        )));
    }

    let feedback = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: form.booking_id,
        rating: form.rating,
        comment: form.comment.filter(|c| !c.trim().is_empty()),
        created_at: now,
    };

    let mut all: Vec<Feedback> = store.read_all(StoreKey::Feedback);
    all.push(feedback.clone());
    store.write_all(StoreKey::Feedback, &all)?;
    Ok(feedback)
}

pub fn list(store: &LocalStore, booking_id: Option<&str>) -> Vec<Feedback> {
    store
        .read_all::<Feedback>(StoreKey::Feedback)
        .into_iter()
        .filter(|f| booking_id.map_or(true, |id| f.booking_id == id))
        .collect()
}
