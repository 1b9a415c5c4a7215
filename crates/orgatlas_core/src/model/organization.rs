//! Organization and phone models.

use crate::model::activity::{ActivityId, ActivityNode};
use crate::model::building::{Building, BuildingId};
use crate::model::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub type OrganizationId = i64;
pub type PhoneId = i64;

/// Phone number shared by value across organizations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phone {
    pub id: PhoneId,
    pub number: String,
}

/// Stored organization row, without relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRecord {
    pub id: OrganizationId,
    pub name: String,
    pub building_id: BuildingId,
}

/// Organization with its building, phones and activities resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub building_id: BuildingId,
    pub building: Building,
    pub phones: Vec<Phone>,
    pub activities: Vec<ActivityNode>,
}

impl Organization {
    /// Returns ids of directly attached activities.
    pub fn activity_ids(&self) -> BTreeSet<ActivityId> {
        self.activities.iter().map(|activity| activity.id).collect()
    }
}

/// Create request for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub building_id: BuildingId,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    /// Ids that do not exist at creation time are dropped.
    #[serde(default)]
    pub activity_ids: Vec<ActivityId>,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>, building_id: BuildingId) -> Self {
        Self {
            name: name.into(),
            building_id,
            phone_numbers: Vec::new(),
            activity_ids: Vec::new(),
        }
    }

    pub fn with_phone(mut self, number: impl Into<String>) -> Self {
        self.phone_numbers.push(number.into());
        self
    }

    pub fn with_activity(mut self, activity_id: ActivityId) -> Self {
        self.activity_ids.push(activity_id);
        self
    }

    /// Returns the trimmed name.
    pub fn validate(&self) -> Result<String, ValidationError> {
        normalize_name(&self.name, "organization")
    }

    /// Phone numbers in first-seen order, duplicates removed.
    pub fn unique_phone_numbers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.phone_numbers
            .iter()
            .map(String::as_str)
            .filter(|number| seen.insert(*number))
            .collect()
    }

    pub fn unique_activity_ids(&self) -> BTreeSet<ActivityId> {
        self.activity_ids.iter().copied().collect()
    }
}
