//! Service configuration
//!
//! ## Loading Order
//!
//! 1. TOML file (`--config` or `SENTINEL_CONFIG`), if given
//! 2. Environment variables (`DATABASE_URL`, `SENTINEL_API_KEY`,
//!    `NEVDIS_API_URL`, `NEVDIS_API_KEY`, ...)
//! 3. CLI flags (applied by `main`)
//! 4. `validate()`; any error aborts startup
//!
//! Every section is `#[serde(default)]`, so an empty file is a valid config.

pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Used when `SENTINEL_API_KEY` is unset. Never acceptable in production.
pub const DEV_API_KEY: &str = "sentinel-dev-key";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error ({}): {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    pub dashboard: DashboardConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8787")
    pub bind_address: String,
    /// Shared key for ingest, dashboard and internal broadcast
    pub api_key: String,
    /// Maximum request body in bytes (default: 64 KiB)
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
            api_key: String::new(),
            max_payload_size: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Run against the in-process store instead of PostgreSQL
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry base URL. Unset disables lookups entirely.
    pub url: Option<String>,
    pub api_key: String,
    /// Hard cap on one lookup, after which the sighting proceeds without
    /// vehicle data
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: String::new(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Per-frame write timeout for a viewer socket
    pub session_send_timeout_ms: u64,
    /// Outbound frames buffered per viewer before it is considered stuck
    pub session_buffer: usize,
    /// Hub command queue depth
    pub hub_queue_capacity: usize,
    /// How long intake waits for the hub to accept an alert broadcast
    pub publish_timeout_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            session_send_timeout_ms: 2000,
            session_buffer: 64,
            hub_queue_capacity: 256,
            publish_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { queue_capacity: 128 }
    }
}

impl ServiceConfig {
    /// Load from an optional TOML path. `None` yields built-in defaults.
    ///
    /// The result is not validated yet; env and CLI overrides come first.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let config = Self::load_from_file(p)?;
                info!(path = %p.display(), "Loaded service config");
                Ok(config)
            }
            None => {
                info!("No config file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for w in validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("SENTINEL_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = get("SENTINEL_API_KEY") {
            self.server.api_key = v;
        }
        if let Some(v) = get("NEVDIS_API_URL") {
            self.registry.url = Some(v);
        }
        if let Some(v) = get("NEVDIS_API_KEY") {
            self.registry.api_key = v;
        }
        if let Some(n) = get("SENTINEL_REGISTRY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.registry.timeout_secs = n;
        }
        if let Some(n) = get("SENTINEL_MAX_PAYLOAD_SIZE").and_then(|v| v.parse().ok()) {
            self.server.max_payload_size = n;
        }

        if self.server.api_key.is_empty() {
            if cfg!(debug_assertions) {
                warn!("SENTINEL_API_KEY not set, using default dev key. Do NOT use in production");
            } else {
                error!("SENTINEL_API_KEY not set, falling back to insecure default; set SENTINEL_API_KEY");
            }
            self.server.api_key = DEV_API_KEY.to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_secs)
    }

    pub fn session_send_timeout(&self) -> Duration {
        Duration::from_millis(self.dashboard.session_send_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.dashboard.publish_timeout_ms)
    }
}
