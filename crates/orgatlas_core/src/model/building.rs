//! Building domain model.

use crate::geo::GeoPoint;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

pub type BuildingId = i64;

/// Physical location organizations are registered at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    /// Postal address, free-form.
    pub address: String,
    /// Degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Degrees, `[-180, 180]`.
    pub longitude: f64,
}

/// Create request for one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuilding {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewBuilding {
    pub fn new(address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            address: address.into(),
            latitude,
            longitude,
        }
    }

    /// Checks address and coordinate ranges.
    ///
    /// Returns the trimmed address.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ValidationError::BlankAddress);
        }
        GeoPoint::new(self.latitude, self.longitude)?;
        Ok(address.to_string())
    }
}
