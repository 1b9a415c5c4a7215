//! Directory domain model.
//!
//! # Responsibility
//! - Define the records served by the directory: buildings, activities,
//!   phones and organizations.
//! - Define create requests and the validation they run before persistence.
//!
//! # Invariants
//! - Every entity is identified by a storage-assigned integer id.
//! - Entities are created once and never updated or deleted.
//! - Organizations reference buildings and activities by id only; the
//!   many-to-many links live in join tables, not on the records.

pub mod activity;
pub mod building;
pub mod organization;

use crate::geo::GeoError;
use activity::ActivityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name is blank after trim. Carries the entity kind.
    BlankName(&'static str),
    /// Building address is blank after trim.
    BlankAddress,
    /// Coordinates, bounds or radius are not usable.
    Geo(GeoError),
    /// Parent activity does not exist.
    UnknownParent(ActivityId),
    /// Inserting under this parent would exceed the taxonomy depth cap.
    DepthExceeded {
        parent_id: ActivityId,
        parent_level: u32,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(entity) => write!(f, "{entity} name must not be blank"),
            Self::BlankAddress => write!(f, "building address must not be blank"),
            Self::Geo(err) => write!(f, "{err}"),
            Self::UnknownParent(id) => write!(f, "parent activity not found: {id}"),
            Self::DepthExceeded {
                parent_id,
                parent_level,
            } => write!(
                f,
                "maximum activity nesting depth is {}; parent {parent_id} is already at level {parent_level}",
                activity::MAX_ACTIVITY_DEPTH
            ),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeoError> for ValidationError {
    fn from(value: GeoError) -> Self {
        Self::Geo(value)
    }
}

/// Trims `value`, rejecting blank input.
pub(crate) fn normalize_name(
    value: &str,
    entity: &'static str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankName(entity));
    }
    Ok(trimmed.to_string())
}
