//! Persistence contracts for the intake pipeline
//!
//! The pipeline only appends: one sighting row per intake, one alert row per
//! hit, plus a read of the operator watchlist. Backends:
//! - `PgStore`: PostgreSQL via sqlx (production)
//! - `MemoryStore`: in-memory, for `--in-memory` runs and tests

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::types::{Alert, CustomWatchlistEntry, SightingRecord};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("duplicate record: {0}")]
    Duplicate(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Append-only writes of sightings and alerts
#[async_trait]
pub trait SightingStore: Send + Sync {
    /// Persist a sighting row. Called exactly once per accepted sighting.
    async fn insert_sighting(&self, record: &SightingRecord) -> Result<(), StoreError>;

    /// Persist an alert row
    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Cheap connectivity check for the health endpoint
    async fn is_healthy(&self) -> bool {
        true
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Read path of the operator-maintained plate watchlist
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn find_entry(&self, plate: &str) -> Result<Option<CustomWatchlistEntry>, StoreError>;
}
