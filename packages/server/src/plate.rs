//! License-plate lookup collaborator.
//!
//! Resolves a plate to the vehicle attributes needed for a valuation.
//! The production implementation scrapes a registry site with a
//! form-submit-and-table-parse sequence and lives outside this
//! service; here the seam is the trait plus an in-memory directory
//! used for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::workflow::VehicleData;

#[derive(Debug, Error)]
pub enum PlateLookupError {
    #[error("no vehicle found for plate {plate}")]
    NotFound { plate: String },

    #[error("plate lookup failed: {0}")]
    Lookup(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Lookup of vehicle attributes by license plate.
#[async_trait]
pub trait PlateLookup: Send + Sync {
    async fn lookup(&self, plate: &str) -> Result<VehicleData, PlateLookupError>;
}

/// In-memory plate directory.
///
/// Plates are matched case-insensitively.
#[derive(Default)]
pub struct StaticPlateLookup {
    vehicles: HashMap<String, VehicleData>,
}

impl StaticPlateLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicle(mut self, plate: &str, vehicle: VehicleData) -> Self {
        self.vehicles.insert(plate.to_uppercase(), vehicle);
        self
    }
}

#[async_trait]
impl PlateLookup for StaticPlateLookup {
    async fn lookup(&self, plate: &str) -> Result<VehicleData, PlateLookupError> {
        self.vehicles
            .get(&plate.to_uppercase())
            .cloned()
            .ok_or_else(|| PlateLookupError::NotFound {
                plate: plate.to_string(),
            })
    }
}
