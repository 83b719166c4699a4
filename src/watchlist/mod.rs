//! Watchlist evaluation
//!
//! [`WatchlistEvaluator::evaluate`] returns at most one hit per sighting. It
//! performs exactly one store read (the operator watchlist) and is otherwise
//! pure; the precedence table lives in [`rules`].

pub mod rules;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::storage::WatchlistStore;
use crate::types::{VehicleRecord, WatchlistHit};

pub use rules::{first_match, RegistryRule, REGISTRY_RULES};

#[derive(Clone)]
pub struct WatchlistEvaluator {
    store: Arc<dyn WatchlistStore>,
}

impl WatchlistEvaluator {
    pub fn new(store: Arc<dyn WatchlistStore>) -> Self {
        Self { store }
    }

    /// Evaluate a plate against the watchlist rules.
    ///
    /// Never fails: a watchlist read error is logged and evaluation continues
    /// with the registry rules only.
    pub async fn evaluate(&self, plate: &str, vehicle: Option<&VehicleRecord>) -> Option<WatchlistHit> {
        let custom = match self.store.find_entry(plate).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(plate = %plate, error = %e, "Custom watchlist read failed, using registry rules only");
                None
            }
        };

        let hit = first_match(custom.as_ref(), vehicle);
        if let Some(h) = &hit {
            debug!(plate = %plate, kind = %h.kind, priority = %h.priority, "Watchlist hit");
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{CustomWatchlistEntry, HitKind, Priority};

    fn store_with(plate: &str, priority: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_watchlist_entry(CustomWatchlistEntry {
                plate_number: plate.to_string(),
                reason: "Fleet BOLO".to_string(),
                priority: Some(priority.to_string()),
                notes: None,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_evaluate_reads_watchlist_once() {
        let store = store_with("ABC123", "high");
        let evaluator = WatchlistEvaluator::new(store.clone());

        let hit = evaluator.evaluate("ABC123", None).await.unwrap();
        assert_eq!(hit.kind, HitKind::Custom);
        assert_eq!(hit.priority, Priority::High);
        assert_eq!(store.watchlist_reads(), 1);
    }

    #[tokio::test]
    async fn test_unknown_stored_priority_normalizes_to_medium() {
        let evaluator = WatchlistEvaluator::new(store_with("ABC123", "urgent"));
        let hit = evaluator.evaluate("ABC123", None).await.unwrap();
        assert_eq!(hit.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_registry_rules() {
        let store = store_with("ABC123", "low");
        store.fail_watchlist_reads(true);
        let evaluator = WatchlistEvaluator::new(store);

        let stolen = VehicleRecord {
            stolen: true,
            ..VehicleRecord::for_plate("ABC123")
        };
        let hit = evaluator.evaluate("ABC123", Some(&stolen)).await.unwrap();
        assert_eq!(hit.kind, HitKind::Stolen);

        assert!(evaluator.evaluate("ABC123", None).await.is_none());
    }

    #[tokio::test]
    async fn test_evaluation_is_repeatable() {
        let evaluator = WatchlistEvaluator::new(Arc::new(MemoryStore::new()));
        let v = VehicleRecord {
            rego_status: Some("EXPIRED".to_string()),
            rego_expiry: Some("2024-01-01".to_string()),
            ..VehicleRecord::for_plate("XYZ789")
        };
        let first = evaluator.evaluate("XYZ789", Some(&v)).await;
        let second = evaluator.evaluate("XYZ789", Some(&v)).await;
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
