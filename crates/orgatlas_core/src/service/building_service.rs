//! Building use-case service.

use crate::model::building::{Building, BuildingId, NewBuilding};
use crate::repo::building_repo::BuildingRepository;
use crate::service::DirectoryResult;
use log::info;

/// Use-case service wrapper for building operations.
pub struct BuildingService<R: BuildingRepository> {
    repo: R,
}

impl<R: BuildingRepository> BuildingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every building in ascending id order.
    pub fn list_buildings(&self) -> DirectoryResult<Vec<Building>> {
        Ok(self.repo.list_buildings()?)
    }

    pub fn get_building(&self, id: BuildingId) -> DirectoryResult<Option<Building>> {
        Ok(self.repo.get_building(id)?)
    }

    /// Inserts one building after address and coordinate validation.
    pub fn create_building(&self, request: &NewBuilding) -> DirectoryResult<Building> {
        let building = self.repo.create_building(request)?;
        info!(
            "event=building_create module=service status=ok building_id={}",
            building.id
        );
        Ok(building)
    }
}
