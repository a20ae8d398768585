use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::{self, queries, SharedConn};
use crate::errors::AppResult;
use crate::events::{AppEvent, EventBus};
use crate::models::Bucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    PendingBookings,
    ConfirmedBookings,
    JobPhotos,
    ServiceProgress,
    TrackingProgress,
    DataMigrationComplete,
    Feedback,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::PendingBookings => "pendingBookings",
            StoreKey::ConfirmedBookings => "confirmedBookings",
            StoreKey::JobPhotos => "jobPhotos",
            StoreKey::ServiceProgress => "serviceProgress",
            StoreKey::TrackingProgress => "trackingProgress",
            StoreKey::DataMigrationComplete => "dataMigrationComplete",
            StoreKey::Feedback => "feedback",
        }
    }
}

impl From<Bucket> for StoreKey {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Pending => StoreKey::PendingBookings,
            Bucket::Confirmed => StoreKey::ConfirmedBookings,
        }
    }
}

/// JSON blobs under named keys. Every write replaces the whole value for its
/// key; there is no locking across read-modify-write cycles.
#[derive(Clone)]
pub struct LocalStore {
    conn: SharedConn,
    bus: EventBus,
}

impl LocalStore {
    pub fn new(conn: SharedConn, bus: EventBus) -> Self {
        Self { conn, bus }
    }

    /// Missing keys and malformed JSON both read as an empty list. Elements
    /// that parse as JSON but not as `T` are logged and skipped.
    pub fn read_all<T: DeserializeOwned>(&self, key: StoreKey) -> Vec<T> {
        let raw = {
            let conn = db::lock(&self.conn);
            queries::get_value(&conn, key.as_str())
        };

        match raw {
            Ok(Some(json)) => match serde_json::from_str::<Vec<serde_json::Value>>(&json) {
                Ok(values) => decode_each(key, values),
                Err(e) => {
                    tracing::error!(key = key.as_str(), error = %e, "malformed JSON in local store");
                    vec![]
                }
            },
            Ok(None) => vec![],
            Err(e) => {
                tracing::error!(key = key.as_str(), error = %e, "failed to read local store");
                vec![]
            }
        }
    }

    pub fn write_all<T: Serialize>(&self, key: StoreKey, items: &[T]) -> AppResult<()> {
        let json = serde_json::to_string(items)?;
        {
            let conn = db::lock(&self.conn);
            queries::put_value(&conn, key.as_str(), &json)?;
        }
        self.bus.publish(AppEvent::StorageChanged {
            key: key.as_str().to_string(),
        });
        Ok(())
    }

    pub fn read_flag(&self, key: StoreKey) -> bool {
        let conn = db::lock(&self.conn);
        match queries::get_value(&conn, key.as_str()) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                tracing::error!(key = key.as_str(), error = %e, "failed to read local flag");
                false
            }
        }
    }

    pub fn write_flag(&self, key: StoreKey, value: bool) -> AppResult<()> {
        {
            let conn = db::lock(&self.conn);
            queries::put_value(&conn, key.as_str(), if value { "true" } else { "false" })?;
        }
        self.bus.publish(AppEvent::StorageChanged {
            key: key.as_str().to_string(),
        });
        Ok(())
    }

    pub fn clear(&self, key: StoreKey) -> AppResult<()> {
        {
            let conn = db::lock(&self.conn);
            queries::delete_value(&conn, key.as_str())?;
        }
        self.bus.publish(AppEvent::StorageChanged {
            key: key.as_str().to_string(),
        });
        Ok(())
    }
}

fn decode_each<T: DeserializeOwned>(key: StoreKey, values: Vec<serde_json::Value>) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(key = key.as_str(), index, error = %e, "skipping undecodable local record");
                None
            }
        })
        .collect()
}
