//! Sighting Intake Processor
//!
//! One awaited sequence per sighting. Steps 2 and 3 always resolve to a
//! value, so step 4 always runs for a valid report.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatcher::{AlertDispatcher, DispatchError, DispatchReport};
use crate::registry::VehicleRegistry;
use crate::storage::{SightingStore, StoreError};
use crate::types::{RegistryLookup, Sighting, SightingRecord, SightingReport, VehicleRecord, WatchlistHit};
use crate::watchlist::WatchlistEvaluator;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid sighting: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// The sighting was not recorded
    #[error("failed to persist sighting {sighting_id}: {source}")]
    Persist {
        sighting_id: Uuid,
        #[source]
        source: StoreError,
    },

    /// The sighting was recorded but its alert was not
    #[error("sighting {sighting_id} recorded but alert dispatch failed: {source}")]
    Dispatch {
        sighting_id: Uuid,
        #[source]
        source: DispatchError,
    },
}

#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub sighting_id: Uuid,
    pub vehicle: Option<VehicleRecord>,
    pub hit: Option<WatchlistHit>,
    pub dispatch: Option<DispatchReport>,
}

impl IntakeOutcome {
    pub fn alert_id(&self) -> Option<Uuid> {
        self.dispatch.as_ref().map(|d| d.alert_id)
    }
}

#[derive(Clone)]
pub struct IntakeProcessor {
    registry: Arc<dyn VehicleRegistry>,
    evaluator: WatchlistEvaluator,
    store: Arc<dyn SightingStore>,
    dispatcher: AlertDispatcher,
    lookup_timeout: Duration,
}

impl IntakeProcessor {
    pub fn new(
        registry: Arc<dyn VehicleRegistry>,
        evaluator: WatchlistEvaluator,
        store: Arc<dyn SightingStore>,
        dispatcher: AlertDispatcher,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            evaluator,
            store,
            dispatcher,
            lookup_timeout,
        }
    }

    /// Run one sighting through the pipeline:
    ///
    /// 1. validate and assign a sighting id
    /// 2. registry lookup (bounded by `lookup_timeout`)
    /// 3. watchlist evaluation
    /// 4. persist the sighting with its vehicle/hit snapshot
    /// 5. dispatch the alert, if any
    pub async fn process(&self, report: SightingReport) -> Result<IntakeOutcome, IntakeError> {
        let sighting = Sighting::accept(report.validate().map_err(IntakeError::Invalid)?);
        let sighting_id = sighting.id();

        let vehicle = self.lookup(&sighting).await.into_record();
        let hit = self.evaluator.evaluate(sighting.plate(), vehicle.as_ref()).await;

        let record = SightingRecord::build(&sighting, vehicle.as_ref(), hit.as_ref());
        self.store
            .insert_sighting(&record)
            .await
            .map_err(|source| IntakeError::Persist {
                sighting_id,
                source,
            })?;

        info!(
            sighting_id = %sighting_id,
            plate = %sighting.plate(),
            vehicle_id = %sighting.vehicle_id(),
            enriched = vehicle.is_some(),
            hit = ?hit.as_ref().map(|h| h.kind),
            "Sighting recorded"
        );

        let dispatch = match &hit {
            Some(h) => Some(
                self.dispatcher
                    .dispatch(&sighting, h, vehicle.as_ref())
                    .await
                    .map_err(|source| IntakeError::Dispatch {
                        sighting_id,
                        source,
                    })?,
            ),
            None => None,
        };

        Ok(IntakeOutcome {
            sighting_id,
            vehicle,
            hit,
            dispatch,
        })
    }

    async fn lookup(&self, sighting: &Sighting) -> RegistryLookup {
        let lookup = self.registry.lookup(sighting.plate(), sighting.jurisdiction());
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => {
                debug!(plate = %sighting.plate(), resolved = result.is_resolved(), "Registry lookup finished");
                result
            }
            Err(_) => {
                warn!(
                    plate = %sighting.plate(),
                    timeout = ?self.lookup_timeout,
                    "Registry lookup timed out"
                );
                RegistryLookup::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::DashboardHub;
    use crate::notify::NotificationQueue;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    struct FixedRegistry(Option<VehicleRecord>);

    #[async_trait]
    impl VehicleRegistry for FixedRegistry {
        async fn lookup(&self, _plate: &str, _jurisdiction: Option<&str>) -> RegistryLookup {
            match &self.0 {
                Some(v) => RegistryLookup::Resolved(v.clone()),
                None => RegistryLookup::Unavailable,
            }
        }
    }

    struct HangingRegistry;

    #[async_trait]
    impl VehicleRegistry for HangingRegistry {
        async fn lookup(&self, _plate: &str, _jurisdiction: Option<&str>) -> RegistryLookup {
            std::future::pending().await
        }
    }

    fn report(plate: &str) -> SightingReport {
        SightingReport {
            plate_number: plate.to_string(),
            plate_state: None,
            confidence: 0.9,
            timestamp: Utc::now(),
            gps_lat: -37.81,
            gps_lng: 144.96,
            vehicle_id: "car-1".to_string(),
            trip_id: Some("trip-9".to_string()),
        }
    }

    fn processor(registry: Arc<dyn VehicleRegistry>, store: Arc<MemoryStore>) -> IntakeProcessor {
        let (hub_actor, hub) = DashboardHub::new(8);
        tokio::spawn(hub_actor.run(CancellationToken::new()));
        let (notifier, _jobs) = NotificationQueue::new(8);
        let dispatcher = AlertDispatcher::new(store.clone(), hub, notifier);
        IntakeProcessor::new(
            registry,
            WatchlistEvaluator::new(store.clone()),
            store,
            dispatcher,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_clean_sighting_recorded_without_alert() {
        let store = Arc::new(MemoryStore::new());
        let p = processor(Arc::new(FixedRegistry(Some(VehicleRecord::for_plate("ABC123")))), store.clone());

        let outcome = p.process(report("abc 123")).await.unwrap();
        assert!(outcome.hit.is_none());
        assert!(outcome.alert_id().is_none());
        assert_eq!(outcome.vehicle.unwrap().plate, "ABC123");

        let rows = store.sightings();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sighting_id, outcome.sighting_id);
        assert_eq!(rows[0].plate_number, "ABC123");
        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_report_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let p = processor(Arc::new(FixedRegistry(None)), store.clone());

        let mut bad = report("A");
        bad.confidence = 1.5;
        match p.process(bad).await {
            Err(IntakeError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(store.sightings().is_empty());
    }

    #[tokio::test]
    async fn test_hanging_registry_times_out() {
        let store = Arc::new(MemoryStore::new());
        let p = processor(Arc::new(HangingRegistry), store.clone());

        let outcome = p.process(report("XYZ789")).await.unwrap();
        assert!(outcome.vehicle.is_none());
        assert_eq!(store.sightings()[0].rego_status, None);
    }

    #[tokio::test]
    async fn test_alert_failure_keeps_sighting() {
        let store = Arc::new(MemoryStore::new());
        store.fail_alert_writes(true);
        let stolen = VehicleRecord {
            stolen: true,
            ..VehicleRecord::for_plate("ABC123")
        };
        let p = processor(Arc::new(FixedRegistry(Some(stolen))), store.clone());

        match p.process(report("ABC123")).await {
            Err(IntakeError::Dispatch { sighting_id, .. }) => {
                assert_eq!(store.sightings()[0].sighting_id, sighting_id);
                assert_eq!(store.sightings()[0].watchlist_hit.as_deref(), Some("STOLEN_VEHICLE"));
            }
            other => panic!("expected Dispatch error, got {other:?}"),
        }
    }
}
