//! Activity taxonomy use-case service.
//!
//! # Responsibility
//! - Enforce the taxonomy depth cap on activity creation.
//! - Serve activities with their rendered `children` subtrees.
//!
//! # Invariants
//! - A new activity lands at `level(parent) + 1 <= MAX_ACTIVITY_DEPTH`.
//! - Rejected creates write no row.

use crate::model::activity::{ActivityId, ActivityNode, NewActivity, MAX_ACTIVITY_DEPTH};
use crate::model::ValidationError;
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::RepoError;
use crate::service::DirectoryResult;
use crate::taxonomy::{activity_level, TaxonomyIndex, TaxonomyStore};
use log::{info, warn};
use std::collections::BTreeSet;

/// Use-case service wrapper for the activity taxonomy.
pub struct ActivityService<R>
where
    R: ActivityRepository + TaxonomyStore<Error = RepoError>,
{
    repo: R,
}

impl<R> ActivityService<R>
where
    R: ActivityRepository + TaxonomyStore<Error = RepoError>,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads the whole taxonomy into an in-memory index.
    pub fn taxonomy(&self) -> DirectoryResult<TaxonomyIndex> {
        Ok(TaxonomyIndex::from_activities(self.repo.list_activities()?))
    }

    /// Lists every activity (roots and nested) with its subtree.
    pub fn list_activities(&self) -> DirectoryResult<Vec<ActivityNode>> {
        let index = self.taxonomy()?;
        Ok(index
            .iter()
            .filter_map(|activity| index.subtree(activity.id))
            .collect())
    }

    pub fn get_activity(&self, id: ActivityId) -> DirectoryResult<Option<ActivityNode>> {
        if self.repo.get_activity(id)?.is_none() {
            return Ok(None);
        }
        Ok(self.taxonomy()?.subtree(id))
    }

    /// Returns the level of `id` (roots are level 1), `None` when unknown.
    pub fn activity_level(&self, id: ActivityId) -> DirectoryResult<Option<u32>> {
        Ok(activity_level(&self.repo, id)?)
    }

    /// Strict descendants of `id` within the depth cap.
    pub fn descendants(&self, id: ActivityId) -> DirectoryResult<BTreeSet<ActivityId>> {
        Ok(self.taxonomy()?.descendants(id, MAX_ACTIVITY_DEPTH))
    }

    /// Creates one activity, rejecting parents already at the deepest level.
    ///
    /// # Errors
    /// - `ValidationError::BlankName` when the name is blank.
    /// - `ValidationError::UnknownParent` when `parent_id` does not exist.
    /// - `ValidationError::DepthExceeded` when `level(parent) >= 3`.
    pub fn create_activity(&self, request: &NewActivity) -> DirectoryResult<ActivityNode> {
        let name = request.validate()?;

        if let Some(parent_id) = request.parent_id {
            let parent_level = activity_level(&self.repo, parent_id)?
                .ok_or(ValidationError::UnknownParent(parent_id))?;
            if parent_level >= MAX_ACTIVITY_DEPTH {
                warn!(
                    "event=activity_create module=service status=rejected reason=depth_exceeded parent_id={} parent_level={}",
                    parent_id, parent_level
                );
                return Err(ValidationError::DepthExceeded {
                    parent_id,
                    parent_level,
                }
                .into());
            }
        }

        let created = self.repo.create_activity(&NewActivity {
            name,
            parent_id: request.parent_id,
        })?;
        info!(
            "event=activity_create module=service status=ok activity_id={} has_parent={}",
            created.id,
            created.parent_id.is_some()
        );

        Ok(ActivityNode {
            id: created.id,
            name: created.name,
            parent_id: created.parent_id,
            children: Vec::new(),
        })
    }
}
