//! Core domain logic for the OrgAtlas directory.
//! This crate is the single source of truth for directory invariants.

pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;
pub mod taxonomy;

pub use geo::{great_circle_distance_km, BoundingBox, GeoError, GeoPoint, RadiusQuery};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityId, ActivityNode, NewActivity, MAX_ACTIVITY_DEPTH};
pub use model::building::{Building, BuildingId, NewBuilding};
pub use model::organization::{NewOrganization, Organization, OrganizationId, Phone, PhoneId};
pub use model::ValidationError;
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::building_repo::{BuildingRepository, SqliteBuildingRepository};
pub use repo::organization_repo::{
    OrganizationFilter, OrganizationRepository, SqliteOrganizationRepository,
};
pub use repo::{RepoError, RepoResult};
pub use seed::{seed_demo_directory, SeedSummary};
pub use service::activity_service::ActivityService;
pub use service::building_service::BuildingService;
pub use service::organization_service::OrganizationService;
pub use service::{DirectoryError, DirectoryResult, ErrorKind, SqliteDirectory};
pub use taxonomy::{activity_level, expand_descendants, TaxonomyIndex, TaxonomyStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
