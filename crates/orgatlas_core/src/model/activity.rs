//! Activity taxonomy model.
//!
//! # Invariants
//! - Activities form a forest through optional `parent_id` references.
//! - Depth from any root is at most `MAX_ACTIVITY_DEPTH` (root = level 1).
//! - Children are derived by reverse lookup, never stored on the record.

use crate::model::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};

pub type ActivityId = i64;

/// Deepest allowed level in the taxonomy, counting roots as level 1.
pub const MAX_ACTIVITY_DEPTH: u32 = 3;

/// Stored taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    /// `None` means root-level activity.
    pub parent_id: Option<ActivityId>,
}

/// Activity with its rendered subtree, as served to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNode {
    pub id: ActivityId,
    pub name: String,
    pub parent_id: Option<ActivityId>,
    pub children: Vec<ActivityNode>,
}

impl ActivityNode {
    /// Returns this node id followed by every id in its subtree (pre-order).
    pub fn subtree_ids(&self) -> Vec<ActivityId> {
        let mut ids = vec![self.id];
        for child in &self.children {
            ids.extend(child.subtree_ids());
        }
        ids
    }
}

/// Create request for one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    pub parent_id: Option<ActivityId>,
}

impl NewActivity {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child_of(parent_id: ActivityId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent_id),
        }
    }

    /// Returns the trimmed name. Depth is validated by the service layer.
    pub fn validate(&self) -> Result<String, ValidationError> {
        normalize_name(&self.name, "activity")
    }
}
