use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{BookingGateway, BOOKINGS_TABLE, INVOICES_TABLE};
use crate::events::{AppEvent, EventBus, ListenerHandle};

fn fingerprint<T: Serialize>(items: &[T]) -> Option<u64> {
    let json = serde_json::to_string(items).ok()?;
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    Some(hasher.finish())
}

/// Tracks the last seen snapshot of one table and reports whether it moved.
#[derive(Default)]
struct Snapshot {
    last: Option<u64>,
}

impl Snapshot {
    fn changed(&mut self, next: Option<u64>) -> bool {
        let Some(next) = next else { return false };
        let changed = self.last.is_some_and(|prev| prev != next);
        self.last = Some(next);
        changed
    }
}

/// Emulates push notifications for gateways without them by re-fetching both
/// tables on an interval and publishing `RemoteChanged` when a snapshot differs
/// from the previous one.
pub fn spawn_poller(
    gateway: Arc<dyn BookingGateway>,
    bus: EventBus,
    interval: Duration,
) -> ListenerHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut bookings = Snapshot::default();
        let mut invoices = Snapshot::default();

        loop {
            ticker.tick().await;

            match gateway.select(None).await {
                Ok(rows) => {
                    if bookings.changed(fingerprint(&rows)) {
                        bus.publish(AppEvent::RemoteChanged {
                            table: BOOKINGS_TABLE.to_string(),
                        });
                    }
                }
                Err(e) => tracing::warn!(gateway = gateway.name(), error = %e, "booking poll failed"),
            }

            match gateway.select_invoices().await {
                Ok(rows) => {
                    if invoices.changed(fingerprint(&rows)) {
                        bus.publish(AppEvent::RemoteChanged {
                            table: INVOICES_TABLE.to_string(),
                        });
                    }
                }
                Err(e) => tracing::warn!(gateway = gateway.name(), error = %e, "invoice poll failed"),
            }
        }
    });

    ListenerHandle::from_task("remote-poller", task)
}
