//! In-memory store for development runs and tests
//!
//! Thread-safe via `RwLock`. Not durable; data is lost on restart. Writes and
//! watchlist reads can be switched to fail so error paths can be exercised.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{SightingStore, StoreError, WatchlistStore};
use crate::types::{normalize_plate, Alert, CustomWatchlistEntry, SightingRecord};

#[derive(Default)]
pub struct MemoryStore {
    sightings: RwLock<Vec<SightingRecord>>,
    alerts: RwLock<Vec<Alert>>,
    watchlist: RwLock<HashMap<String, CustomWatchlistEntry>>,
    fail_sighting_writes: AtomicBool,
    fail_alert_writes: AtomicBool,
    fail_watchlist_reads: AtomicBool,
    watchlist_reads: AtomicUsize,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a watchlist entry. Keyed by the normalized plate, so
    /// `ABC-123` and `abc 123` are the same entry.
    pub fn upsert_watchlist_entry(&self, entry: CustomWatchlistEntry) -> Result<(), StoreError> {
        let mut watchlist = self.watchlist.write().map_err(poisoned)?;
        watchlist.insert(normalize_plate(&entry.plate_number), entry);
        Ok(())
    }

    /// Snapshot of stored sightings, insertion order
    pub fn sightings(&self) -> Vec<SightingRecord> {
        self.sightings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Snapshot of stored alerts, insertion order
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of watchlist reads served so far
    pub fn watchlist_reads(&self) -> usize {
        self.watchlist_reads.load(Ordering::Relaxed)
    }

    pub fn fail_sighting_writes(&self, fail: bool) {
        self.fail_sighting_writes.store(fail, Ordering::Relaxed);
    }

    pub fn fail_alert_writes(&self, fail: bool) {
        self.fail_alert_writes.store(fail, Ordering::Relaxed);
    }

    pub fn fail_watchlist_reads(&self, fail: bool) {
        self.fail_watchlist_reads.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl SightingStore for MemoryStore {
    async fn insert_sighting(&self, record: &SightingRecord) -> Result<(), StoreError> {
        if self.fail_sighting_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("sighting writes disabled".to_string()));
        }

        let mut sightings = self.sightings.write().map_err(poisoned)?;
        if sightings.iter().any(|s| s.sighting_id == record.sighting_id) {
            return Err(StoreError::Duplicate(record.sighting_id.to_string()));
        }
        sightings.push(record.clone());
        Ok(())
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        if self.fail_alert_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("alert writes disabled".to_string()));
        }

        let mut alerts = self.alerts.write().map_err(poisoned)?;
        if alerts
            .iter()
            .any(|a| a.alert_id == alert.alert_id || a.sighting_id == alert.sighting_id)
        {
            return Err(StoreError::Duplicate(alert.alert_id.to_string()));
        }
        alerts.push(alert.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn find_entry(&self, plate: &str) -> Result<Option<CustomWatchlistEntry>, StoreError> {
        self.watchlist_reads.fetch_add(1, Ordering::Relaxed);

        if self.fail_watchlist_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("watchlist reads disabled".to_string()));
        }

        let watchlist = self.watchlist.read().map_err(poisoned)?;
        Ok(watchlist.get(&normalize_plate(plate)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sighting, SightingReport};
    use chrono::Utc;

    fn record() -> SightingRecord {
        let report = SightingReport {
            plate_number: "ABC123".to_string(),
            plate_state: None,
            confidence: 0.9,
            timestamp: Utc::now(),
            gps_lat: -33.86,
            gps_lng: 151.2,
            vehicle_id: "car-1".to_string(),
            trip_id: None,
        };
        SightingRecord::build(&Sighting::accept(report), None, None)
    }

    #[tokio::test]
    async fn test_duplicate_sighting_rejected() {
        let store = MemoryStore::new();
        let rec = record();
        store.insert_sighting(&rec).await.unwrap();
        let err = store.insert_sighting(&rec).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.sightings().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryStore::new();
        store.fail_sighting_writes(true);
        assert!(store.insert_sighting(&record()).await.is_err());
        assert!(store.sightings().is_empty());
    }

    #[tokio::test]
    async fn test_watchlist_lookup_counts_reads() {
        let store = MemoryStore::new();
        store
            .upsert_watchlist_entry(CustomWatchlistEntry {
                plate_number: "ABC123".to_string(),
                reason: "Person of interest".to_string(),
                priority: Some("high".to_string()),
                notes: None,
            })
            .unwrap();

        assert!(store.find_entry("ABC123").await.unwrap().is_some());
        assert!(store.find_entry("ZZZ999").await.unwrap().is_none());
        assert_eq!(store.watchlist_reads(), 2);
    }

    #[tokio::test]
    async fn test_watchlist_keys_are_normalized() {
        let store = MemoryStore::new();
        store
            .upsert_watchlist_entry(CustomWatchlistEntry {
                plate_number: "abc-123".to_string(),
                reason: "Toll evasion".to_string(),
                priority: None,
                notes: None,
            })
            .unwrap();

        let entry = store.find_entry("ABC123").await.unwrap().unwrap();
        assert_eq!(entry.plate_number, "abc-123");
        assert!(store.find_entry("ABC 123").await.unwrap().is_some());
    }
}
