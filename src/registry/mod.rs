//! Vehicle registry enrichment
//!
//! - `client`  - HTTP client for the NEVDIS registry broker
//! - `mapping` - tolerant response-to-`VehicleRecord` mapping

pub mod client;
pub mod mapping;

pub use client::NevdisClient;

use async_trait::async_trait;

use crate::types::RegistryLookup;

/// Resolves a plate into a vehicle record.
///
/// Implementations never fail: any error is reported as
/// [`RegistryLookup::Unavailable`] so the pipeline is never blocked by
/// enrichment.
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    async fn lookup(&self, plate: &str, jurisdiction: Option<&str>) -> RegistryLookup;
}

/// Registry used when no registry URL is configured.
pub struct DisabledRegistry;

#[async_trait]
impl VehicleRegistry for DisabledRegistry {
    async fn lookup(&self, _plate: &str, _jurisdiction: Option<&str>) -> RegistryLookup {
        RegistryLookup::Unavailable
    }
}
