use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::config::AppConfig;
use crate::db::{self, SharedConn};
use crate::events::{self, EventBus, ListenerHandle};
use crate::services::feedback::FeedbackRequester;
use crate::services::gateway::{
    self, BookingGateway, RestGateway, SqliteGateway, BOOKINGS_TABLE, INVOICES_TABLE,
};
use crate::services::local_store::LocalStore;
use crate::services::messaging::twilio::TwilioSmsProvider;
use crate::services::messaging::{LogMessaging, MessagingProvider};
use crate::services::sync;
use crate::services::transition::StatusTransition;

/// Everything a request handler needs, built once at startup. Background
/// listeners live as long as the state or until `shutdown`.
pub struct AppState {
    pub config: AppConfig,
    pub bus: EventBus,
    pub store: LocalStore,
    pub gateway: Arc<dyn BookingGateway>,
    pub transition: StatusTransition,
    pub feedback: Arc<FeedbackRequester>,
    listeners: Mutex<Vec<ListenerHandle>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        bus: EventBus,
        local: SharedConn,
        gateway: Arc<dyn BookingGateway>,
        messaging: Arc<dyn MessagingProvider>,
    ) -> Self {
        let store = LocalStore::new(local, bus.clone());
        let transition = StatusTransition::new(store.clone(), Arc::clone(&gateway), bus.clone());
        let feedback = Arc::new(FeedbackRequester::new(
            store.clone(),
            Arc::clone(&gateway),
            messaging,
            bus.clone(),
            config.business_name.clone(),
        ));

        Self {
            config,
            bus,
            store,
            gateway,
            transition,
            feedback,
            listeners: Mutex::new(vec![]),
        }
    }

    /// Opens both stores, picks the gateway, runs the one-time local data
    /// migration and starts the background listeners.
    pub async fn init(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let bus = EventBus::default();
        let local = open_local(&config.local_store_url)?;

        let mut poller = None;
        let gateway: Arc<dyn BookingGateway> = match config.remote_url.as_deref() {
            Some(url) => {
                tracing::info!(url, "using REST booking gateway");
                let rest: Arc<dyn BookingGateway> =
                    Arc::new(RestGateway::new(url, &config.remote_api_key, bus.clone())?);
                poller = Some(gateway::spawn_poller(
                    Arc::clone(&rest),
                    bus.clone(),
                    config.remote_poll_interval(),
                ));
                rest
            }
            None => {
                tracing::info!(path = %config.database_url, "using SQLite booking gateway");
                let conn = db::shared(db::init_db(&config.database_url)?);
                Arc::new(SqliteGateway::new(conn, bus.clone()))
            }
        };

        let messaging: Arc<dyn MessagingProvider> = match TwilioSmsProvider::from_config(&config) {
            Some(twilio) => Arc::new(twilio),
            None => {
                tracing::warn!("Twilio not configured, SMS will only be logged");
                Arc::new(LogMessaging)
            }
        };

        let state = Arc::new(Self::new(config, bus, local, gateway, messaging));

        match sync::migrate_local_to_remote(&state.store, state.gateway.as_ref()).await {
            Ok(Some(report)) if report.push_failures > 0 => {
                tracing::warn!(?report, "local data migration incomplete, will retry next start")
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "local data migration failed"),
        }

        state.start_listeners().await;
        if let Some(poller) = poller {
            state.lock_listeners().push(poller);
        }
        Ok(state)
    }

    /// Refreshes the local lists when the remote bookings table changes and
    /// watches invoices for feedback requests.
    pub async fn start_listeners(self: &Arc<Self>) {
        // Invoices already paid before startup never trigger a request
        self.feedback.check_invoices().await;

        let throttle = self.config.refresh_throttle();

        let feedback = Arc::clone(&self.feedback);
        let invoices = events::spawn_listener(
            &self.bus,
            "invoice-watcher",
            throttle,
            events::is_remote_change(INVOICES_TABLE),
            move || {
                let feedback = Arc::clone(&feedback);
                async move {
                    feedback.check_invoices().await;
                }
            },
        );

        let store = self.store.clone();
        let gateway = Arc::clone(&self.gateway);
        let bookings = events::spawn_listener(
            &self.bus,
            "remote-bookings",
            throttle,
            events::is_remote_change(BOOKINGS_TABLE),
            move || {
                let store = store.clone();
                let gateway = Arc::clone(&gateway);
                async move {
                    if let Err(e) = sync::reconcile(&store, gateway.as_ref()).await {
                        tracing::error!(error = %e, "failed to refresh local bookings");
                    }
                }
            },
        );

        self.lock_listeners().extend([invoices, bookings]);
    }

    pub fn listener_names(&self) -> Vec<&'static str> {
        self.lock_listeners().iter().map(|l| l.name()).collect()
    }

    /// Stops every background listener. Requests already running finish.
    pub fn shutdown(&self) {
        let stopped: Vec<ListenerHandle> = self.lock_listeners().drain(..).collect();
        tracing::info!(count = stopped.len(), "stopping listeners");
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<ListenerHandle>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn open_local(path: &str) -> anyhow::Result<SharedConn> {
    let conn = db::init_db(path).with_context(|| format!("failed to open local store at {path}"))?;
    Ok(db::shared(conn))
}
