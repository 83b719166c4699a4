//! Alert Dispatcher - persist, broadcast, notify

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hub::{BroadcastEnvelope, FanoutReport, HubHandle};
use crate::notify::{NotificationJob, NotificationQueue};
use crate::storage::{SightingStore, StoreError};
use crate::types::{Alert, AlertPayload, Sighting, VehicleRecord, WatchlistHit};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to persist alert {alert_id}: {source}")]
    Persist {
        alert_id: Uuid,
        #[source]
        source: StoreError,
    },
}

/// What happened to one alert after it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub alert_id: Uuid,
    /// `None` when the broadcast could not be handed to the hub
    pub broadcast: Option<FanoutReport>,
    pub notification_enqueued: bool,
}

/// Upper bound on handing one alert to the hub and getting its report back
pub const DEFAULT_BROADCAST_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct AlertDispatcher {
    store: Arc<dyn SightingStore>,
    hub: HubHandle,
    notifier: NotificationQueue,
    broadcast_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn SightingStore>, hub: HubHandle, notifier: NotificationQueue) -> Self {
        Self {
            store,
            hub,
            notifier,
            broadcast_timeout: DEFAULT_BROADCAST_TIMEOUT,
        }
    }

    pub fn with_broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout = timeout;
        self
    }

    /// Persist the alert, then broadcast and (for high/critical) enqueue a
    /// notification.
    ///
    /// Only the persist step can fail the call. Broadcast and enqueue are
    /// independent and best-effort; their failures are logged.
    pub async fn dispatch(
        &self,
        sighting: &Sighting,
        hit: &WatchlistHit,
        vehicle: Option<&VehicleRecord>,
    ) -> Result<DispatchReport, DispatchError> {
        let alert = Alert::new(sighting, hit, vehicle);

        self.store
            .insert_alert(&alert)
            .await
            .map_err(|source| DispatchError::Persist {
                alert_id: alert.alert_id,
                source,
            })?;

        info!(
            alert_id = %alert.alert_id,
            sighting_id = %alert.sighting_id,
            plate = %alert.plate_number,
            alert_type = %hit.kind,
            priority = %hit.priority,
            "Watchlist alert recorded"
        );

        let payload = alert.payload();
        let broadcast = self.broadcast(&payload).await;

        let notification_enqueued = if hit.priority.requires_notification() {
            match self.notifier.enqueue(NotificationJob::watchlist_alert(&payload)) {
                Ok(()) => {
                    debug!(alert_id = %alert.alert_id, "Notification job enqueued");
                    true
                }
                Err(e) => {
                    warn!(alert_id = %alert.alert_id, error = %e, "Notification enqueue failed");
                    false
                }
            }
        } else {
            false
        };

        Ok(DispatchReport {
            alert_id: alert.alert_id,
            broadcast,
            notification_enqueued,
        })
    }

    async fn broadcast(&self, payload: &AlertPayload) -> Option<FanoutReport> {
        let envelope = match BroadcastEnvelope::watchlist_alert(payload) {
            Ok(env) => env,
            Err(e) => {
                warn!(alert_id = %payload.alert_id, error = %e, "Alert payload not serializable");
                return None;
            }
        };

        match tokio::time::timeout(self.broadcast_timeout, self.hub.publish(envelope)).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                warn!(alert_id = %payload.alert_id, error = %e, "Alert broadcast failed");
                None
            }
            Err(_) => {
                warn!(
                    alert_id = %payload.alert_id,
                    timeout = ?self.broadcast_timeout,
                    "Alert broadcast timed out, hub is backed up"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::DashboardHub;
    use crate::storage::MemoryStore;
    use crate::types::{HitKind, HitSource, Priority, SightingReport};
    use chrono::Utc;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn sighting() -> Sighting {
        Sighting::accept(SightingReport {
            plate_number: "ABC123".to_string(),
            plate_state: Some("NSW".to_string()),
            confidence: 0.93,
            timestamp: Utc::now(),
            gps_lat: -33.87,
            gps_lng: 151.21,
            vehicle_id: "car-42".to_string(),
            trip_id: None,
        })
    }

    fn hit(priority: Priority) -> WatchlistHit {
        WatchlistHit {
            kind: HitKind::Custom,
            source: HitSource::CustomWatchlist,
            priority,
            reason: "BOLO".to_string(),
            details: serde_json::json!({}),
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        dispatcher: AlertDispatcher,
        hub: HubHandle,
        jobs: mpsc::Receiver<NotificationJob>,
        token: CancellationToken,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let (hub_actor, hub) = DashboardHub::new(16);
        let token = CancellationToken::new();
        tokio::spawn(hub_actor.run(token.clone()));
        let (notifier, jobs) = NotificationQueue::new(4);
        let dispatcher = AlertDispatcher::new(store.clone(), hub.clone(), notifier);
        Fixture {
            store,
            dispatcher,
            hub,
            jobs,
            token,
        }
    }

    #[tokio::test]
    async fn test_critical_hit_is_stored_broadcast_and_notified() {
        let mut fx = fixture();
        let (tx, mut viewer) = mpsc::channel(4);
        fx.hub.connect(tx).await.unwrap();

        let report = fx
            .dispatcher
            .dispatch(&sighting(), &hit(Priority::Critical), None)
            .await
            .unwrap();

        assert_eq!(fx.store.alerts().len(), 1);
        assert_eq!(fx.store.alerts()[0].alert_id, report.alert_id);
        assert_eq!(report.broadcast.unwrap().delivered, 1);
        assert!(report.notification_enqueued);

        let frame: serde_json::Value = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "watchlist_alert");
        assert_eq!(frame["data"]["vehicle_id"], "car-42");
        assert_eq!(frame["data"]["plate"], "ABC123");

        let job = fx.jobs.try_recv().unwrap();
        assert_eq!(job.alert.alert_id, report.alert_id);
    }

    #[tokio::test]
    async fn test_medium_hit_not_notified() {
        let mut fx = fixture();
        let report = fx
            .dispatcher
            .dispatch(&sighting(), &hit(Priority::Medium), None)
            .await
            .unwrap();
        assert!(!report.notification_enqueued);
        assert!(fx.jobs.try_recv().is_err());
        assert_eq!(fx.store.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_stops_dispatch() {
        let mut fx = fixture();
        let (tx, mut viewer) = mpsc::channel(4);
        fx.hub.connect(tx).await.unwrap();
        fx.store.fail_alert_writes(true);

        let err = fx
            .dispatcher
            .dispatch(&sighting(), &hit(Priority::Critical), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Persist { .. }));
        assert!(viewer.try_recv().is_err());
        assert!(fx.jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_failure_does_not_undo_alert() {
        let fx = fixture();
        drop(fx.jobs);
        let report = fx
            .dispatcher
            .dispatch(&sighting(), &hit(Priority::High), None)
            .await
            .unwrap();
        assert!(!report.notification_enqueued);
        assert!(report.broadcast.is_some());
        assert_eq!(fx.store.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_hub_down_still_records_alert() {
        let fx = fixture();
        fx.token.cancel();
        // Wait until the hub has actually stopped
        while fx.hub.session_count().await.is_ok() {
            tokio::task::yield_now().await;
        }

        let report = fx
            .dispatcher
            .dispatch(&sighting(), &hit(Priority::High), None)
            .await
            .unwrap();
        assert!(report.broadcast.is_none());
        assert!(report.notification_enqueued);
        assert_eq!(fx.store.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_hub_does_not_hold_up_dispatch() {
        let store = Arc::new(MemoryStore::new());
        // Never run, so publishes queue up without a reply
        let (_idle_hub, hub) = DashboardHub::new(4);
        let (notifier, mut jobs) = NotificationQueue::new(4);
        let dispatcher = AlertDispatcher::new(store.clone(), hub, notifier)
            .with_broadcast_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let report = dispatcher
            .dispatch(&sighting(), &hit(Priority::Critical), None)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(report.broadcast.is_none());
        assert!(report.notification_enqueued);
        assert!(jobs.try_recv().is_ok());
        assert_eq!(store.alerts().len(), 1);
    }
}
