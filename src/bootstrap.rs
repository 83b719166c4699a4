//! Component wiring shared by the binary and the integration tests

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::AppState;
use crate::config::ServiceConfig;
use crate::hub::DashboardHub;
use crate::notify::{NotificationQueue, NotificationSink, NotificationWorker};
use crate::pipeline::{AlertDispatcher, IntakeProcessor};
use crate::registry::{DisabledRegistry, NevdisClient, VehicleRegistry};
use crate::storage::{SightingStore, WatchlistStore};
use crate::watchlist::WatchlistEvaluator;

/// Registry client from config; disabled when no URL is configured.
pub fn build_registry(config: &ServiceConfig) -> Result<Arc<dyn VehicleRegistry>, reqwest::Error> {
    match &config.registry.url {
        Some(url) => {
            let client = NevdisClient::new(url, &config.registry.api_key, config.registry_timeout())?;
            info!(url = %client.base_url(), "Vehicle registry enabled");
            Ok(Arc::new(client))
        }
        None => {
            info!("No registry URL configured, sightings will not be enriched");
            Ok(Arc::new(DisabledRegistry))
        }
    }
}

/// Handler state plus the background tasks that still need spawning
pub struct Assembled {
    pub state: Arc<AppState>,
    pub hub: DashboardHub,
    pub worker: NotificationWorker,
}

pub fn assemble(
    config: ServiceConfig,
    store: Arc<dyn SightingStore>,
    watchlist: Arc<dyn WatchlistStore>,
    registry: Arc<dyn VehicleRegistry>,
    sink: Box<dyn NotificationSink>,
) -> Assembled {
    let (hub, hub_handle) = DashboardHub::new(config.dashboard.hub_queue_capacity);
    let (notifier, jobs) = NotificationQueue::new(config.notifications.queue_capacity);

    let dispatcher = AlertDispatcher::new(store.clone(), hub_handle.clone(), notifier)
        .with_broadcast_timeout(config.publish_timeout());
    let intake = IntakeProcessor::new(
        registry,
        WatchlistEvaluator::new(watchlist),
        store.clone(),
        dispatcher,
        config.registry_timeout(),
    );

    Assembled {
        state: Arc::new(AppState {
            intake,
            hub: hub_handle,
            store,
            config,
        }),
        hub,
        worker: NotificationWorker::new(jobs, sink),
    }
}

impl Assembled {
    /// Spawn the hub and notification worker; both stop on `shutdown`.
    pub fn spawn(self, shutdown: &CancellationToken) -> (Arc<AppState>, Vec<JoinHandle<()>>) {
        let tasks = vec![
            tokio::spawn(self.hub.run(shutdown.clone())),
            tokio::spawn(self.worker.run(shutdown.clone())),
        ];
        (self.state, tasks)
    }
}
