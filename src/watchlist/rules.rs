//! Watchlist rule table
//!
//! Precedence, highest first:
//!
//! | # | Rule        | Condition                          | Priority                    |
//! |---|-------------|------------------------------------|-----------------------------|
//! | 1 | custom      | plate on the operator watchlist    | stored (unknown → medium)   |
//! | 2 | stolen      | `stolen`                           | critical                    |
//! | 3 | write-off   | `wovr_status` ≠ `NOT_LISTED`       | high if statutory, else medium |
//! | 4 | rego lapsed | status `EXPIRED` or `CANCELLED`    | medium                      |
//! | 5 | encumbrance | `ppsr_encumbered`                  | medium                      |
//!
//! First match wins. Rules 2-5 live in [`REGISTRY_RULES`] in table order and
//! are pure functions of the vehicle record.

use serde_json::json;

use crate::types::{
    CustomWatchlistEntry, HitKind, HitSource, Priority, VehicleRecord, WatchlistHit,
    WOVR_STATUTORY,
};

/// A registry-backed rule: pure predicate and outcome in one function.
pub struct RegistryRule {
    pub name: &'static str,
    pub check: fn(&VehicleRecord) -> Option<WatchlistHit>,
}

/// Registry rules in precedence order. The custom watchlist rule runs before
/// all of these.
pub const REGISTRY_RULES: &[RegistryRule] = &[
    RegistryRule { name: "stolen", check: stolen },
    RegistryRule { name: "write_off", check: write_off },
    RegistryRule { name: "rego_lapsed", check: rego_lapsed },
    RegistryRule { name: "encumbrance", check: encumbrance },
];

/// Rule 1: operator watchlist entry
pub fn custom(entry: &CustomWatchlistEntry) -> WatchlistHit {
    WatchlistHit {
        kind: HitKind::Custom,
        source: HitSource::CustomWatchlist,
        priority: Priority::normalize(entry.priority.as_deref()),
        reason: entry.reason.clone(),
        details: json!({ "notes": entry.notes }),
    }
}

fn stolen(v: &VehicleRecord) -> Option<WatchlistHit> {
    v.stolen.then(|| WatchlistHit {
        kind: HitKind::Stolen,
        source: HitSource::Nevdis,
        priority: Priority::Critical,
        reason: "STOLEN_VEHICLE".to_string(),
        details: json!({
            "jurisdiction": v.stolen_jurisdiction,
            "date": v.stolen_date,
        }),
    })
}

fn write_off(v: &VehicleRecord) -> Option<WatchlistHit> {
    if !v.is_written_off() {
        return None;
    }

    let statutory = v.wovr_type.as_deref() == Some(WOVR_STATUTORY);
    let sub_type = v.wovr_type.as_deref().unwrap_or("UNKNOWN");

    Some(WatchlistHit {
        kind: if statutory {
            HitKind::WovrStatutory
        } else {
            HitKind::WovrRepairable
        },
        source: HitSource::Nevdis,
        priority: if statutory { Priority::High } else { Priority::Medium },
        reason: format!("WOVR_{sub_type}"),
        details: json!({ "wovr_type": v.wovr_type }),
    })
}

fn rego_lapsed(v: &VehicleRecord) -> Option<WatchlistHit> {
    v.registration_lapsed().then(|| WatchlistHit {
        kind: HitKind::ExpiredRego,
        source: HitSource::Nevdis,
        priority: Priority::Medium,
        reason: "EXPIRED_REGISTRATION".to_string(),
        details: json!({ "expiry": v.rego_expiry }),
    })
}

fn encumbrance(v: &VehicleRecord) -> Option<WatchlistHit> {
    v.ppsr_encumbered.then(|| WatchlistHit {
        kind: HitKind::Ppsr,
        source: HitSource::Nevdis,
        priority: Priority::Medium,
        reason: "PPSR_ENCUMBERED".to_string(),
        details: json!({}),
    })
}

/// Apply the whole table to already-fetched inputs.
pub fn first_match(
    custom_entry: Option<&CustomWatchlistEntry>,
    vehicle: Option<&VehicleRecord>,
) -> Option<WatchlistHit> {
    if let Some(entry) = custom_entry {
        return Some(custom(entry));
    }

    let vehicle = vehicle?;
    REGISTRY_RULES.iter().find_map(|rule| (rule.check)(vehicle))
}
