//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Unknown keys only warn; the file still loads. Range checks are fatal.

use std::collections::HashSet;

use super::ServiceConfig;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `ServiceConfig`. Keep in sync with the
/// section structs in `mod.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "server",
        "server.bind_address",
        "server.api_key",
        "server.max_payload_size",
        "database",
        "database.url",
        "database.in_memory",
        "registry",
        "registry.url",
        "registry.api_key",
        "registry.timeout_secs",
        "dashboard",
        "dashboard.session_send_timeout_ms",
        "dashboard.session_buffer",
        "dashboard.hub_queue_capacity",
        "dashboard.publish_timeout_ms",
        "notifications",
        "notifications.queue_capacity",
    ]
    .into_iter()
    .collect()
}

/// Recursively collect dotted key paths from a TOML tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

/// Warnings for unknown keys in a raw TOML document. Parse errors are left
/// to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Checks
// ============================================================================

/// Fatal consistency checks. Returns every violation.
pub fn validate_ranges(config: &ServiceConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.server.bind_address.trim().is_empty() {
        errors.push("server.bind_address must not be empty".to_string());
    }
    if config.server.max_payload_size == 0 {
        errors.push("server.max_payload_size must be > 0".to_string());
    }
    if !config.database.in_memory && config.database.url.trim().is_empty() {
        errors.push("database.url must be set unless database.in_memory = true".to_string());
    }
    if config.registry.timeout_secs == 0 {
        errors.push("registry.timeout_secs must be > 0".to_string());
    }
    if config.registry.url.is_some() && config.registry.api_key.is_empty() {
        errors.push("registry.api_key must be set when registry.url is configured".to_string());
    }
    if config.dashboard.session_send_timeout_ms == 0 {
        errors.push("dashboard.session_send_timeout_ms must be > 0".to_string());
    }
    if config.dashboard.session_buffer == 0 {
        errors.push("dashboard.session_buffer must be > 0".to_string());
    }
    if config.dashboard.hub_queue_capacity == 0 {
        errors.push("dashboard.hub_queue_capacity must be > 0".to_string());
    }
    if config.dashboard.publish_timeout_ms == 0 {
        errors.push("dashboard.publish_timeout_ms must be > 0".to_string());
    }
    if config.notifications.queue_capacity == 0 {
        errors.push("notifications.queue_capacity must be > 0".to_string());
    }

    errors
}
