//! Plate Sentinel: fleet plate-sighting intake and watchlist alerting
//!
//! ## Architecture
//!
//! - **Registry**: best-effort vehicle enrichment from the national registry
//! - **Watchlist**: fixed-precedence rules producing at most one hit per sighting
//! - **Pipeline**: intake (enrich, evaluate, persist) and alert dispatch
//! - **Hub**: single-owner actor fanning alerts out to live dashboard viewers
//! - **Notify**: best-effort channel for high-severity alerts

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod hub;
pub mod notify;
pub mod pipeline;
pub mod registry;
pub mod storage;
pub mod types;
pub mod watchlist;

// Re-export configuration
pub use config::{ConfigError, ServiceConfig};

// Re-export commonly used types
pub use types::{
    Alert, AlertPayload, CustomWatchlistEntry, GeoPoint, HitKind, HitSource, Priority,
    RegistryLookup, Sighting, SightingRecord, SightingReport, VehicleRecord, WatchlistHit,
};

// Re-export pipeline components
pub use pipeline::{AlertDispatcher, IntakeError, IntakeOutcome, IntakeProcessor};

// Re-export hub components
pub use hub::{BroadcastEnvelope, DashboardHub, FanoutReport, HubHandle};

// Re-export storage
pub use storage::{MemoryStore, PgStore, SightingStore, StoreError, WatchlistStore};
