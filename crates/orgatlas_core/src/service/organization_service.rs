//! Organization directory queries.
//!
//! # Responsibility
//! - Answer organization queries by building, activity (with descendant
//!   expansion), activity name, geography, id and name.
//! - Create organizations and return them fully resolved.
//!
//! # Invariants
//! - Results are ordered by ascending organization id.
//! - Activity queries cover the activity and every descendant within the
//!   depth cap, so results are monotonic under descent.
//! - Activity-name queries use the first matching activity only (lowest id).
//! - Resolving a result list costs a fixed number of batched queries, not
//!   a query per organization.

use crate::geo::{filter_in_radius, filter_in_rectangle, BoundingBox, RadiusQuery};
use crate::model::activity::{ActivityId, MAX_ACTIVITY_DEPTH};
use crate::model::building::{Building, BuildingId};
use crate::model::organization::{
    NewOrganization, Organization, OrganizationId, OrganizationRecord,
};
use crate::model::ValidationError;
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::building_repo::BuildingRepository;
use crate::repo::organization_repo::{OrganizationFilter, OrganizationRepository};
use crate::repo::RepoError;
use crate::service::DirectoryResult;
use crate::taxonomy::TaxonomyIndex;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Directory query layer over organizations.
pub struct OrganizationService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    organizations: O,
    activities: A,
    buildings: B,
}

impl<O, A, B> OrganizationService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    pub fn new(organizations: O, activities: A, buildings: B) -> Self {
        Self {
            organizations,
            activities,
            buildings,
        }
    }

    /// Organizations registered in one building. The building need not exist.
    pub fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> DirectoryResult<Vec<Organization>> {
        self.query(&OrganizationFilter::InBuilding(building_id))
    }

    /// Organizations tagged with `activity_id` or any of its descendants.
    ///
    /// Unknown ids yield an empty list.
    pub fn organizations_by_activity(
        &self,
        activity_id: ActivityId,
    ) -> DirectoryResult<Vec<Organization>> {
        let index = self.taxonomy()?;
        self.by_activity_in(&index, activity_id)
    }

    /// Resolves the first activity whose name contains `text` (ignoring
    /// case), then behaves as `organizations_by_activity`.
    pub fn organizations_by_activity_name(
        &self,
        text: &str,
    ) -> DirectoryResult<Vec<Organization>> {
        let index = self.taxonomy()?;
        let Some(activity_id) = index.find_by_name(text).map(|activity| activity.id) else {
            debug!("event=organization_query module=service kind=activity_name status=no_match");
            return Ok(Vec::new());
        };
        self.by_activity_in(&index, activity_id)
    }

    /// Organizations whose building lies within `radius_km` of the point.
    ///
    /// # Errors
    /// - `ValidationError::Geo` for non-finite or out-of-range coordinates
    ///   and negative radius.
    pub fn organizations_in_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> DirectoryResult<Vec<Organization>> {
        let query =
            RadiusQuery::new(latitude, longitude, radius_km).map_err(ValidationError::from)?;
        let buildings = self.buildings.list_buildings()?;
        let building_ids: HashSet<BuildingId> = filter_in_radius(&query, &buildings)
            .into_iter()
            .map(|building| building.id)
            .collect();
        debug!(
            "event=organization_query module=service kind=radius radius_km={} building_count={}",
            query.radius_km(),
            building_ids.len()
        );
        self.query(&OrganizationFilter::InAnyBuilding(building_ids))
    }

    /// Organizations whose building lies inside the inclusive rectangle.
    pub fn organizations_in_rectangle(
        &self,
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> DirectoryResult<Vec<Organization>> {
        let bounds = BoundingBox::new(min_latitude, max_latitude, min_longitude, max_longitude)
            .map_err(ValidationError::from)?;
        let buildings = self.buildings.list_buildings()?;
        let building_ids = filter_in_rectangle(&bounds, &buildings)
            .into_iter()
            .map(|building| building.id)
            .collect();
        self.query(&OrganizationFilter::InAnyBuilding(building_ids))
    }

    pub fn organization_by_id(&self, id: OrganizationId) -> DirectoryResult<Option<Organization>> {
        let Some(record) = self.organizations.get_organization(id)? else {
            return Ok(None);
        };
        let index = self.taxonomy()?;
        let mut resolved = self.resolve(&index, vec![record])?;
        Ok(resolved.pop())
    }

    /// Organizations whose name contains `text`, ignoring case.
    pub fn organizations_by_name(&self, text: &str) -> DirectoryResult<Vec<Organization>> {
        self.query(&OrganizationFilter::NameContains(text.to_string()))
    }

    /// Creates one organization and returns it resolved.
    ///
    /// Phone numbers are reused by value; activity ids without a stored node
    /// are dropped.
    ///
    /// # Errors
    /// - `ValidationError::BlankName` when the name is blank.
    /// - `DirectoryError::ReferentialViolation` when the building is missing.
    pub fn create_organization(&self, request: &NewOrganization) -> DirectoryResult<Organization> {
        let id = self.organizations.create_organization(request)?;
        let organization = self.organization_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("organization {id} missing right after insert"))
        })?;
        info!(
            "event=organization_create module=service status=ok organization_id={} phone_count={} activity_count={} dropped_activity_count={}",
            organization.id,
            organization.phones.len(),
            organization.activities.len(),
            request
                .unique_activity_ids()
                .len()
                .saturating_sub(organization.activities.len())
        );
        Ok(organization)
    }

    fn taxonomy(&self) -> DirectoryResult<TaxonomyIndex> {
        Ok(TaxonomyIndex::from_activities(self.activities.list_activities()?))
    }

    fn by_activity_in(
        &self,
        index: &TaxonomyIndex,
        activity_id: ActivityId,
    ) -> DirectoryResult<Vec<Organization>> {
        if index.get(activity_id).is_none() {
            return Ok(Vec::new());
        }
        let mut activity_ids: HashSet<ActivityId> =
            index.descendants(activity_id, MAX_ACTIVITY_DEPTH).into_iter().collect();
        activity_ids.insert(activity_id);
        debug!(
            "event=organization_query module=service kind=activity activity_id={} expanded_count={}",
            activity_id,
            activity_ids.len()
        );

        let records = self
            .organizations
            .list_organizations(&OrganizationFilter::WithAnyActivity(activity_ids))?;
        self.resolve(index, records)
    }

    fn query(&self, filter: &OrganizationFilter) -> DirectoryResult<Vec<Organization>> {
        let records = self.organizations.list_organizations(filter)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let index = self.taxonomy()?;
        self.resolve(&index, records)
    }

    fn resolve(
        &self,
        index: &TaxonomyIndex,
        records: Vec<OrganizationRecord>,
    ) -> DirectoryResult<Vec<Organization>> {
        let organization_ids: Vec<OrganizationId> =
            records.iter().map(|record| record.id).collect();
        let building_ids: Vec<BuildingId> = records
            .iter()
            .map(|record| record.building_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let buildings: HashMap<BuildingId, Building> = self
            .buildings
            .get_buildings(&building_ids)?
            .into_iter()
            .map(|building| (building.id, building))
            .collect();
        let mut phones = self.organizations.list_phones_for(&organization_ids)?;
        let mut links = self.organizations.list_activity_ids_for(&organization_ids)?;

        let mut resolved = Vec::with_capacity(records.len());
        for record in records {
            let building = buildings.get(&record.building_id).cloned().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "organization {} references missing building {}",
                    record.id, record.building_id
                ))
            })?;
            let activities = links
                .remove(&record.id)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|activity_id| index.subtree(activity_id))
                .collect();

            resolved.push(Organization {
                id: record.id,
                name: record.name,
                building_id: record.building_id,
                building,
                phones: phones.remove(&record.id).unwrap_or_default(),
                activities,
            });
        }
        Ok(resolved)
    }
}
