//! Alert types: Alert (durable record of a hit) and its broadcast payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GeoPoint, Sighting, VehicleRecord, WatchlistHit};

/// Envelope `type` for watchlist alert broadcasts and notification jobs
pub const WATCHLIST_ALERT: &str = "watchlist_alert";

/// The durable record of a watchlist hit bound to the sighting that raised it.
/// One alert per sighting at most; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub alert_id: Uuid,
    pub sighting_id: Uuid,
    pub plate_number: String,
    /// Fleet vehicle that made the sighting
    pub vehicle_id: String,
    pub jurisdiction: Option<String>,
    /// Registry snapshot at the time of the sighting
    pub vehicle: Option<VehicleRecord>,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub hit: WatchlistHit,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(sighting: &Sighting, hit: &WatchlistHit, vehicle: Option<&VehicleRecord>) -> Self {
        Self {
            alert_id: Uuid::new_v4(),
            sighting_id: sighting.id(),
            plate_number: sighting.plate().to_string(),
            vehicle_id: sighting.vehicle_id().to_string(),
            jurisdiction: sighting
                .jurisdiction()
                .map(str::to_string)
                .or_else(|| vehicle.and_then(|v| v.state.clone())),
            vehicle: vehicle.cloned(),
            location: sighting.location(),
            timestamp: sighting.observed_at(),
            hit: hit.clone(),
            created_at: Utc::now(),
        }
    }

    /// The `data` object shared by the dashboard broadcast and the
    /// notification job.
    pub fn payload(&self) -> AlertPayload {
        AlertPayload {
            alert_id: self.alert_id,
            sighting_id: self.sighting_id,
            plate: self.plate_number.clone(),
            vehicle_id: self.vehicle_id.clone(),
            alert_type: self.hit.kind.as_str().to_string(),
            priority: self.hit.priority,
            reason: self.hit.reason.clone(),
            vehicle: self.vehicle.clone(),
            location: self.location,
            timestamp: self.timestamp,
        }
    }
}

/// Alert summary pushed to dashboards and the notification channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertPayload {
    pub alert_id: Uuid,
    pub sighting_id: Uuid,
    pub plate: String,
    pub vehicle_id: String,
    pub alert_type: String,
    pub priority: super::Priority,
    pub reason: String,
    pub vehicle: Option<VehicleRecord>,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}
