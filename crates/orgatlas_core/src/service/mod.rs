//! Directory use-case services.
//!
//! # Responsibility
//! - Compose repositories, the taxonomy engine and geo predicates into the
//!   directory read queries and create commands.
//! - Map repository failures into one caller-facing error type.
//!
//! # Invariants
//! - Lookups by id return `Option`; absence is never an error.
//! - Validation failures and storage rejections stay distinguishable.

pub mod activity_service;
pub mod building_service;
pub mod organization_service;

use crate::model::ValidationError;
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::repo::building_repo::SqliteBuildingRepository;
use crate::repo::organization_repo::SqliteOrganizationRepository;
use crate::repo::{RepoError, RepoResult};
use activity_service::ActivityService;
use building_service::BuildingService;
use organization_service::OrganizationService;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Caller-facing error for directory operations.
#[derive(Debug)]
pub enum DirectoryError {
    /// Input rejected before storage was touched.
    Validation(ValidationError),
    /// Storage rejected a reference to a missing entity.
    ReferentialViolation(String),
    /// Any other repository failure.
    Repo(RepoError),
}

/// Coarse classification for transport adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Maps to a 400-equivalent.
    InvalidInput,
    /// Maps to a 500-equivalent.
    Internal,
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::ReferentialViolation(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::ReferentialViolation(message) => {
                write!(f, "referential integrity violation: {message}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ReferentialViolation(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for DirectoryError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for DirectoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::ReferentialViolation(message) => Self::ReferentialViolation(message),
            other => Self::Repo(other),
        }
    }
}

/// All directory services wired over one SQLite connection.
pub struct SqliteDirectory<'conn> {
    pub buildings: BuildingService<SqliteBuildingRepository<'conn>>,
    pub activities: ActivityService<SqliteActivityRepository<'conn>>,
    pub organizations: OrganizationService<
        SqliteOrganizationRepository<'conn>,
        SqliteActivityRepository<'conn>,
        SqliteBuildingRepository<'conn>,
    >,
}

impl<'conn> SqliteDirectory<'conn> {
    /// Builds every service from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            buildings: BuildingService::new(SqliteBuildingRepository::try_new(conn)?),
            activities: ActivityService::new(SqliteActivityRepository::try_new(conn)?),
            organizations: OrganizationService::new(
                SqliteOrganizationRepository::try_new(conn)?,
                SqliteActivityRepository::try_new(conn)?,
                SqliteBuildingRepository::try_new(conn)?,
            ),
        })
    }
}
