use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::events::{AppEvent, EventBus, Notification};
use crate::models::{Booking, BookingStatus, Bucket};
use crate::services::gateway::BookingGateway;
use crate::services::local_store::{LocalStore, StoreKey};

pub const FAILURE_MESSAGE: &str = "Failed to update booking status";

/// Which store(s) a status change is written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Local,
    Remote,
    #[default]
    Both,
}

impl Placement {
    fn local(&self) -> bool {
        matches!(self, Placement::Local | Placement::Both)
    }

}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub booking: Booking,
    pub notification: Notification,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct StatusTransition {
    store: LocalStore,
    gateway: Arc<dyn BookingGateway>,
    bus: EventBus,
    in_flight: AtomicBool,
}

impl StatusTransition {
    pub fn new(store: LocalStore, gateway: Arc<dyn BookingGateway>, bus: EventBus) -> Self {
        Self {
            store,
            gateway,
            bus,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Writes `booking` with its status replaced by `target`. The target is
    /// taken as-is. With `Placement::Both` a remote failure leaves the local
    /// write in place, and a booking with no remote row yet is inserted.
    pub async fn apply(
        &self,
        booking: &Booking,
        target: BookingStatus,
        placement: Placement,
    ) -> AppResult<TransitionOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!(booking_id = %booking.id, "status update already in flight");
            return Err(AppError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let updated = booking.with_status(target);
        match self.persist(&updated, placement).await {
            Ok(()) => {
                tracing::info!(
                    booking_id = %updated.id,
                    from = booking.status.as_str(),
                    to = target.as_str(),
                    ?placement,
                    "booking status updated"
                );
                let notification = Notification::success(target.transition_message());
                self.bus.publish(AppEvent::BookingUpdated {
                    booking_id: updated.id.clone(),
                    status: target,
                });
                self.bus.notify(notification.clone());
                Ok(TransitionOutcome {
                    booking: updated,
                    notification,
                })
            }
            Err(e) => {
                tracing::error!(booking_id = %updated.id, error = %e, "failed to update booking status");
                self.bus.notify(Notification::error(FAILURE_MESSAGE));
                Err(e)
            }
        }
    }

    async fn persist(&self, booking: &Booking, placement: Placement) -> AppResult<()> {
        if placement.local() {
            self.replace_local(booking)?;
        }
        match placement {
            Placement::Local => Ok(()),
            Placement::Remote => self.gateway.update(booking).await,
            Placement::Both => match self.gateway.update(booking).await {
                Err(AppError::NotFound(_)) => {
                    tracing::debug!(booking_id = %booking.id, "no remote row yet, inserting");
                    self.gateway.insert(booking).await
                }
                other => other,
            },
        }
    }

    /// Replaces the booking in whichever local list currently holds it.
    fn replace_local(&self, booking: &Booking) -> AppResult<()> {
        for bucket in [Bucket::Pending, Bucket::Confirmed] {
            let key = StoreKey::from(bucket);
            let mut list: Vec<Booking> = self.store.read_all(key);
            if let Some(slot) = list.iter_mut().find(|b| b.id == booking.id) {
                *slot = booking.clone();
                return self.store.write_all(key, &list);
            }
        }
        Err(AppError::NotFound(format!("booking {} in local store", booking.id)))
    }
}
