use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::models::BookingStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AppEvent {
    BookingUpdated {
        booking_id: String,
        status: BookingStatus,
    },
    ServiceProgressUpdated {
        booking_id: String,
    },
    StorageChanged {
        key: String,
    },
    RemoteChanged {
        table: String,
    },
    FeedbackRequested {
        booking_id: String,
        invoice_id: String,
    },
    Notification(Notification),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::BookingUpdated { .. } => "booking-updated",
            AppEvent::ServiceProgressUpdated { .. } => "service-progress-updated",
            AppEvent::StorageChanged { .. } => "storage-changed",
            AppEvent::RemoteChanged { .. } => "remote-changed",
            AppEvent::FeedbackRequested { .. } => "feedback-requested",
            AppEvent::Notification(_) => "notification",
        }
    }

    pub fn booking_id(&self) -> Option<&str> {
        match self {
            AppEvent::BookingUpdated { booking_id, .. }
            | AppEvent::ServiceProgressUpdated { booking_id }
            | AppEvent::FeedbackRequested { booking_id, .. } => Some(booking_id),
            _ => None,
        }
    }
}

/// In-process broadcast of change notifications. Cloning shares the channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: AppEvent) {
        tracing::debug!(event = event.name(), "publishing event");
        // No receivers is fine
        let _ = self.tx.send(event);
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(AppEvent::Notification(notification));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Running listener task. Dropping the handle unsubscribes it and discards any
/// pending throttle window.
pub struct ListenerHandle {
    name: &'static str,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub(crate) fn from_task(name: &'static str, task: JoinHandle<()>) -> Self {
        Self { name, task }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Calls `on_refresh` once per burst of matching events. The first matching
/// event opens a window of `throttle`; everything arriving inside it is folded
/// into the same refresh.
pub fn spawn_listener<P, F, Fut>(
    bus: &EventBus,
    name: &'static str,
    throttle: Duration,
    matches: P,
    mut on_refresh: F,
) -> ListenerHandle
where
    P: Fn(&AppEvent) -> bool + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let mut rx = bus.subscribe();
    let task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if matches(&event) => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(listener = name, skipped, "listener lagged, refreshing");
                }
                Err(RecvError::Closed) => break,
            }

            let mut closed = false;
            if !throttle.is_zero() {
                let deadline = tokio::time::Instant::now() + throttle;
                loop {
                    match tokio::time::timeout_at(deadline, rx.recv()).await {
                        Err(_) => break,
                        Ok(Err(RecvError::Closed)) => {
                            closed = true;
                            break;
                        }
                        Ok(_) => continue,
                    }
                }
            }

            tracing::debug!(listener = name, "refreshing");
            on_refresh().await;

            if closed {
                break;
            }
        }
    });

    ListenerHandle { name, task }
}

pub fn is_storage_change(keys: &'static [&'static str]) -> impl Fn(&AppEvent) -> bool + Send + 'static {
    move |event| matches!(event, AppEvent::StorageChanged { key } if keys.contains(&key.as_str()))
}

pub fn is_remote_change(table: &'static str) -> impl Fn(&AppEvent) -> bool + Send + 'static {
    move |event| matches!(event, AppEvent::RemoteChanged { table: t } if t == table)
}
