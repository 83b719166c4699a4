//! NEVDIS registry client: best-effort HTTP lookup of a plate
//!
//! One outbound request per lookup, no retry. Every failure mode collapses to
//! [`RegistryLookup::Unavailable`] and is logged here; nothing propagates.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::mapping::map_vehicle;
use super::VehicleRegistry;
use crate::types::RegistryLookup;

/// HTTP client for the vehicle registry broker
#[derive(Clone)]
pub struct NevdisClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NevdisClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn plate_url(&self, plate: &str) -> String {
        format!("{}/vehicle/plate/{}", self.base_url, plate)
    }
}

#[async_trait]
impl VehicleRegistry for NevdisClient {
    async fn lookup(&self, plate: &str, jurisdiction: Option<&str>) -> RegistryLookup {
        let mut req = self
            .http
            .get(self.plate_url(plate))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        if let Some(state) = jurisdiction {
            req = req.header("X-State", state);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(plate = %plate, error = %e, timeout = e.is_timeout(), "Registry lookup failed");
                return RegistryLookup::Unavailable;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(plate = %plate, status = %status, "Registry lookup returned non-success status");
            return RegistryLookup::Unavailable;
        }

        let body: serde_json::Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(plate = %plate, error = %e, "Registry response body is not valid JSON");
                return RegistryLookup::Unavailable;
            }
        };

        match map_vehicle(&body, plate) {
            Some(record) => {
                debug!(plate = %plate, state = ?record.state, "Registry record resolved");
                RegistryLookup::Resolved(record)
            }
            None => {
                warn!(plate = %plate, "Registry response body is not an object");
                RegistryLookup::Unavailable
            }
        }
    }
}
