//! Watchlist types: Priority, HitKind, HitSource, WatchlistHit, CustomWatchlistEntry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert priority. Ordering follows severity: `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Parse a stored priority, falling back to `Medium` for anything that is
    /// not one of the four recognized levels.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some("critical") => Self::Critical,
            Some("high") => Self::High,
            Some("medium") => Self::Medium,
            Some("low") => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Critical and high hits go to the notification channel as well.
    pub fn requires_notification(self) -> bool {
        self >= Self::High
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hit type tag (`type` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    Custom,
    Stolen,
    WovrStatutory,
    WovrRepairable,
    ExpiredRego,
    Ppsr,
}

impl HitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Stolen => "stolen",
            Self::WovrStatutory => "wovr_statutory",
            Self::WovrRepairable => "wovr_repairable",
            Self::ExpiredRego => "expired_rego",
            Self::Ppsr => "ppsr",
        }
    }
}

impl fmt::Display for HitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which subsystem produced the hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    /// Operator-maintained plate list
    CustomWatchlist,
    /// National vehicle registry data
    Nevdis,
}

impl HitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomWatchlist => "custom_watchlist",
            Self::Nevdis => "nevdis",
        }
    }
}

/// The single highest-precedence rule outcome for a sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistHit {
    #[serde(rename = "type")]
    pub kind: HitKind,
    pub source: HitSource,
    pub priority: Priority,
    pub reason: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// A row of the operator-maintained `plate_watchlist` table.
///
/// `priority` is kept raw because operators may store values outside the
/// recognized levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomWatchlistEntry {
    pub plate_number: String,
    pub reason: String,
    pub priority: Option<String>,
    pub notes: Option<String>,
}
