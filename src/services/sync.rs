use std::collections::HashSet;

use serde::Serialize;

use crate::errors::AppResult;
use crate::models::{Booking, Bucket};
use crate::services::bookings;
use crate::services::gateway::BookingGateway;
use crate::services::local_store::{LocalStore, StoreKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub pushed: usize,
    pub push_failures: usize,
    pub pending: usize,
    pub confirmed: usize,
}

/// Inserts every local booking the remote table does not know about.
async fn push_missing(store: &LocalStore, gateway: &dyn BookingGateway) -> AppResult<(usize, usize)> {
    let remote_ids: HashSet<String> = gateway
        .select(None)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();

    let mut pushed = 0;
    let mut failures = 0;
    for booking in bookings::list_local(store, None) {
        if remote_ids.contains(&booking.id) {
            continue;
        }
        match gateway.insert(&booking).await {
            Ok(()) => pushed += 1,
            Err(e) => {
                failures += 1;
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to push local booking");
            }
        }
    }
    Ok((pushed, failures))
}

/// One-time copy of local bookings into the remote table, guarded by the
/// `dataMigrationComplete` flag. The flag is only set when every push succeeds.
pub async fn migrate_local_to_remote(
    store: &LocalStore,
    gateway: &dyn BookingGateway,
) -> AppResult<Option<SyncReport>> {
    if store.read_flag(StoreKey::DataMigrationComplete) {
        return Ok(None);
    }

    let (pushed, push_failures) = push_missing(store, gateway).await?;
    if push_failures == 0 {
        store.write_flag(StoreKey::DataMigrationComplete, true)?;
    }
    tracing::info!(pushed, push_failures, "local data migration finished");

    Ok(Some(SyncReport {
        pushed,
        push_failures,
        ..Default::default()
    }))
}

/// Pushes local-only bookings, then rewrites both local lists from the remote
/// table. Rows present in both stores take the remote version.
pub async fn reconcile(store: &LocalStore, gateway: &dyn BookingGateway) -> AppResult<SyncReport> {
    let (pushed, push_failures) = push_missing(store, gateway).await?;
    let remote = gateway.select(None).await?;

    let (pending, confirmed): (Vec<Booking>, Vec<Booking>) = remote
        .into_iter()
        .filter(|b| b.bucket().is_some())
        .partition(|b| b.bucket() == Some(Bucket::Pending));

    store.write_all(StoreKey::PendingBookings, &pending)?;
    store.write_all(StoreKey::ConfirmedBookings, &confirmed)?;

    let report = SyncReport {
        pushed,
        push_failures,
        pending: pending.len(),
        confirmed: confirmed.len(),
    };
    tracing::info!(?report, gateway = gateway.name(), "reconciled local store with remote");
    Ok(report)
}
