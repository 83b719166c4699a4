//! Sighting types: SightingReport (inbound payload), Sighting (accepted),
//! SightingRecord (persisted row with denormalized snapshot)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GeoPoint, Priority, VehicleRecord, WatchlistHit};

/// Minimum plate length after normalization
pub const MIN_PLATE_LEN: usize = 2;

// ============================================================================
// Inbound payload
// ============================================================================

/// A plate sighting as reported by a field sensor.
///
/// Field names follow the sensor wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SightingReport {
    pub plate_number: String,
    #[serde(default)]
    pub plate_state: Option<String>,
    /// OCR confidence, 0.0 - 1.0
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub gps_lat: f64,
    pub gps_lng: f64,
    /// Fleet vehicle carrying the sensor
    pub vehicle_id: String,
    #[serde(default)]
    pub trip_id: Option<String>,
}

/// Upper-case the plate and strip everything that is not an ASCII letter or digit.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl SightingReport {
    /// Validate and normalize the report, collecting every violation.
    pub fn validate(mut self) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        self.plate_number = normalize_plate(&self.plate_number);
        if self.plate_number.len() < MIN_PLATE_LEN {
            errors.push(format!(
                "plate_number must have at least {MIN_PLATE_LEN} alphanumeric characters"
            ));
        }

        self.plate_state = self
            .plate_state
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty());

        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            errors.push("confidence must be between 0 and 1".to_string());
        }
        if !self.gps_lat.is_finite() || !(-90.0..=90.0).contains(&self.gps_lat) {
            errors.push("gps_lat must be between -90 and 90".to_string());
        }
        if !self.gps_lng.is_finite() || !(-180.0..=180.0).contains(&self.gps_lng) {
            errors.push("gps_lng must be between -180 and 180".to_string());
        }

        self.vehicle_id = self.vehicle_id.trim().to_string();
        if self.vehicle_id.is_empty() {
            errors.push("vehicle_id must not be empty".to_string());
        }

        self.trip_id = self
            .trip_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Accepted sighting
// ============================================================================

/// An accepted sighting. The id is assigned once at intake and never changes;
/// fields are read-only after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Sighting {
    id: Uuid,
    report: SightingReport,
}

impl Sighting {
    /// Accept a validated report, assigning a fresh sighting id.
    pub fn accept(report: SightingReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            report,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn plate(&self) -> &str {
        &self.report.plate_number
    }

    pub fn jurisdiction(&self) -> Option<&str> {
        self.report.plate_state.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.report.confidence
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.report.timestamp
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.report.gps_lat,
            lng: self.report.gps_lng,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.report.vehicle_id
    }

    pub fn trip_id(&self) -> Option<&str> {
        self.report.trip_id.as_deref()
    }
}

// ============================================================================
// Persisted row
// ============================================================================

/// The `plate_sightings` row: the sighting plus a denormalized snapshot of the
/// registry record and watchlist outcome so later lookups need no joins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SightingRecord {
    pub sighting_id: Uuid,
    pub vehicle_id: String,
    pub trip_id: Option<String>,
    pub plate_number: String,
    /// Reported jurisdiction, falling back to the registry's
    pub plate_state: Option<String>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub gps_lat: f64,
    pub gps_lng: f64,
    pub rego_status: Option<String>,
    pub rego_expiry: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_colour: Option<String>,
    pub vin: Option<String>,
    pub stolen_flag: bool,
    pub stolen_jurisdiction: Option<String>,
    pub stolen_date: Option<String>,
    pub wovr_status: Option<String>,
    pub wovr_type: Option<String>,
    pub ppsr_encumbered: bool,
    /// Hit reason code, if any
    pub watchlist_hit: Option<String>,
    pub watchlist_priority: Option<Priority>,
}

impl SightingRecord {
    pub fn build(
        sighting: &Sighting,
        vehicle: Option<&VehicleRecord>,
        hit: Option<&WatchlistHit>,
    ) -> Self {
        let plate_state = sighting
            .jurisdiction()
            .map(str::to_string)
            .or_else(|| vehicle.and_then(|v| v.state.clone()));

        Self {
            sighting_id: sighting.id(),
            vehicle_id: sighting.vehicle_id().to_string(),
            trip_id: sighting.trip_id().map(str::to_string),
            plate_number: sighting.plate().to_string(),
            plate_state,
            confidence: sighting.confidence(),
            timestamp: sighting.observed_at(),
            gps_lat: sighting.location().lat,
            gps_lng: sighting.location().lng,
            rego_status: vehicle.and_then(|v| v.rego_status.clone()),
            rego_expiry: vehicle.and_then(|v| v.rego_expiry.clone()),
            vehicle_make: vehicle.and_then(|v| v.make.clone()),
            vehicle_model: vehicle.and_then(|v| v.model.clone()),
            vehicle_year: vehicle.and_then(|v| v.year),
            vehicle_colour: vehicle.and_then(|v| v.colour.clone()),
            vin: vehicle.and_then(|v| v.vin.clone()),
            stolen_flag: vehicle.is_some_and(|v| v.stolen),
            stolen_jurisdiction: vehicle.and_then(|v| v.stolen_jurisdiction.clone()),
            stolen_date: vehicle.and_then(|v| v.stolen_date.clone()),
            wovr_status: vehicle.map(|v| v.wovr_status.clone()),
            wovr_type: vehicle.and_then(|v| v.wovr_type.clone()),
            ppsr_encumbered: vehicle.is_some_and(|v| v.ppsr_encumbered),
            watchlist_hit: hit.map(|h| h.reason.clone()),
            watchlist_priority: hit.map(|h| h.priority),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SightingReport {
        SightingReport {
            plate_number: " abc-123 ".to_string(),
            plate_state: Some(" qld".to_string()),
            confidence: 0.92,
            timestamp: Utc::now(),
            gps_lat: -27.47,
            gps_lng: 153.02,
            vehicle_id: "car-42".to_string(),
            trip_id: Some(String::new()),
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let r = report().validate().unwrap();
        assert_eq!(r.plate_number, "ABC123");
        assert_eq!(r.plate_state.as_deref(), Some("QLD"));
        assert_eq!(r.trip_id, None);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut r = report();
        r.plate_number = "-".to_string();
        r.confidence = 1.5;
        r.gps_lat = 91.0;
        r.gps_lng = f64::NAN;
        r.vehicle_id = "  ".to_string();

        let errors = r.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_accept_assigns_distinct_ids() {
        let a = Sighting::accept(report().validate().unwrap());
        let b = Sighting::accept(report().validate().unwrap());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_record_without_vehicle_has_null_snapshot() {
        let s = Sighting::accept(report().validate().unwrap());
        let rec = SightingRecord::build(&s, None, None);
        assert_eq!(rec.sighting_id, s.id());
        assert_eq!(rec.plate_state.as_deref(), Some("QLD"));
        assert!(rec.vehicle_make.is_none());
        assert!(rec.wovr_status.is_none());
        assert!(!rec.stolen_flag);
        assert!(rec.watchlist_hit.is_none());
    }

    #[test]
    fn test_record_falls_back_to_registry_state() {
        let mut r = report();
        r.plate_state = None;
        let s = Sighting::accept(r.validate().unwrap());
        let vehicle = VehicleRecord {
            state: Some("NSW".to_string()),
            ..VehicleRecord::for_plate("ABC123")
        };
        let rec = SightingRecord::build(&s, Some(&vehicle), None);
        assert_eq!(rec.plate_state.as_deref(), Some("NSW"));
        assert_eq!(rec.wovr_status.as_deref(), Some("NOT_LISTED"));
    }
}
