//! Registry types: VehicleRecord and the RegistryLookup outcome

use serde::{Deserialize, Serialize};

/// Write-off register value meaning "not on the register"
pub const WOVR_NOT_LISTED: &str = "NOT_LISTED";

/// Write-off sub-type for statutory (non-repairable) write-offs
pub const WOVR_STATUTORY: &str = "STATUTORY";

/// Normalized registry data for a plate.
///
/// Every attribute except the flags is optional: the registry may omit a field
/// or return one that fails to parse, and that only blanks the one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRecord {
    pub plate: String,
    /// Registering jurisdiction
    pub state: Option<String>,
    pub rego_status: Option<String>,
    pub rego_expiry: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub colour: Option<String>,
    pub body_type: Option<String>,
    pub vin: Option<String>,
    pub engine_number: Option<String>,
    pub stolen: bool,
    pub stolen_jurisdiction: Option<String>,
    pub stolen_date: Option<String>,
    /// Write-off register status, `NOT_LISTED` when clean
    pub wovr_status: String,
    pub wovr_type: Option<String>,
    /// Financial encumbrance registered against the vehicle
    pub ppsr_encumbered: bool,
}

impl VehicleRecord {
    /// A clean record with only the plate set.
    pub fn for_plate(plate: &str) -> Self {
        Self {
            plate: plate.to_string(),
            wovr_status: WOVR_NOT_LISTED.to_string(),
            ..Self::default()
        }
    }

    /// True when the write-off register lists this vehicle
    pub fn is_written_off(&self) -> bool {
        !self.wovr_status.is_empty() && self.wovr_status != WOVR_NOT_LISTED
    }

    /// True when registration is expired or cancelled
    pub fn registration_lapsed(&self) -> bool {
        matches!(self.rego_status.as_deref(), Some("EXPIRED" | "CANCELLED"))
    }
}

/// Outcome of a registry lookup.
///
/// `Unavailable` covers every failure (transport, non-success status,
/// malformed body). It means "no evidence", never "vehicle is clean".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLookup {
    Resolved(VehicleRecord),
    Unavailable,
}

impl RegistryLookup {
    pub fn record(&self) -> Option<&VehicleRecord> {
        match self {
            Self::Resolved(record) => Some(record),
            Self::Unavailable => None,
        }
    }

    pub fn into_record(self) -> Option<VehicleRecord> {
        match self {
            Self::Resolved(record) => Some(record),
            Self::Unavailable => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}
