//! Shared data structures for the sighting-to-alert pipeline
//!
//! - `SightingReport` / `Sighting` / `SightingRecord`: intake payload, accepted
//!   sighting, persisted row
//! - `VehicleRecord` / `RegistryLookup`: registry enrichment
//! - `WatchlistHit` / `Priority` / `CustomWatchlistEntry`: rule evaluation
//! - `Alert` / `AlertPayload`: durable alert and its broadcast form

mod alert;
mod sighting;
mod vehicle;
mod watchlist;

pub use alert::*;
pub use sighting::*;
pub use vehicle::*;
pub use watchlist::*;

use serde::{Deserialize, Serialize};

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}
