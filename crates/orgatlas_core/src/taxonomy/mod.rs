//! Activity taxonomy engine.
//!
//! # Responsibility
//! - Define the read contract over stored activity nodes (`TaxonomyStore`).
//! - Compute node levels and bounded descendant sets.
//! - Render activity subtrees for callers that need `children`.
//!
//! # Invariants
//! - Level walks and descendant walks terminate on corrupt (cyclic) data.
//! - A descendant set never contains its start node.
//! - Descendant walks never go deeper than the requested generation count.

use crate::model::activity::{Activity, ActivityId, ActivityNode, MAX_ACTIVITY_DEPTH};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::convert::Infallible;

/// Read-only view over stored activity nodes.
pub trait TaxonomyStore {
    type Error;

    /// Loads one node by id.
    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, Self::Error>;
    /// Lists direct children in insertion order.
    fn children(&self, parent_id: ActivityId) -> Result<Vec<Activity>, Self::Error>;
}

/// Returns the level of `id`, counting the node itself as level 1.
///
/// Returns `None` when `id` is unknown.
pub fn activity_level<S>(store: &S, id: ActivityId) -> Result<Option<u32>, S::Error>
where
    S: TaxonomyStore + ?Sized,
{
    let Some(start) = store.activity(id)? else {
        return Ok(None);
    };

    let mut visited = HashSet::from([id]);
    let mut level = 1;
    let mut cursor = start.parent_id;
    while let Some(parent_id) = cursor {
        if !visited.insert(parent_id) {
            break;
        }
        level += 1;
        cursor = store
            .activity(parent_id)?
            .and_then(|parent| parent.parent_id);
    }
    Ok(Some(level))
}

/// Collects ids reachable below `id`, at most `max_depth` generations deep.
///
/// The start node is excluded. Unknown ids and leaves yield an empty set.
pub fn expand_descendants<S>(
    store: &S,
    id: ActivityId,
    max_depth: u32,
) -> Result<BTreeSet<ActivityId>, S::Error>
where
    S: TaxonomyStore + ?Sized,
{
    let mut visited = HashSet::from([id]);
    let mut descendants = BTreeSet::new();
    let mut frontier = vec![id];
    let mut remaining_depth = max_depth;

    while remaining_depth > 0 && !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        for parent_id in frontier {
            for child in store.children(parent_id)? {
                if visited.insert(child.id) {
                    descendants.insert(child.id);
                    next_frontier.push(child.id);
                }
            }
        }
        frontier = next_frontier;
        remaining_depth -= 1;
    }

    Ok(descendants)
}

/// In-memory arena over a full activity listing.
///
/// Nodes are keyed by id; children come from a reverse index keyed by
/// parent id, ordered by ascending child id.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    nodes: HashMap<ActivityId, Activity>,
    children: HashMap<ActivityId, Vec<ActivityId>>,
    order: Vec<ActivityId>,
}

impl TaxonomyIndex {
    pub fn from_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let mut activities: Vec<Activity> = activities.into_iter().collect();
        activities.sort_by_key(|activity| activity.id);

        let mut index = Self::default();
        for activity in activities {
            if let Some(parent_id) = activity.parent_id {
                index.children.entry(parent_id).or_default().push(activity.id);
            }
            index.order.push(activity.id);
            index.nodes.insert(activity.id, activity);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.nodes.get(&id)
    }

    /// Iterates all nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn child_ids(&self, parent_id: ActivityId) -> &[ActivityId] {
        self.children
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn level(&self, id: ActivityId) -> Option<u32> {
        activity_level(self, id).unwrap_or_else(|never| match never {})
    }

    pub fn descendants(&self, id: ActivityId, max_depth: u32) -> BTreeSet<ActivityId> {
        expand_descendants(self, id, max_depth).unwrap_or_else(|never| match never {})
    }

    /// First node (by id) whose name contains `text`, ignoring case.
    pub fn find_by_name(&self, text: &str) -> Option<&Activity> {
        let needle = text.to_lowercase();
        self.iter()
            .find(|activity| activity.name.to_lowercase().contains(needle.as_str()))
    }

    /// Renders `id` with its children, at most `MAX_ACTIVITY_DEPTH`
    /// generations below it.
    pub fn subtree(&self, id: ActivityId) -> Option<ActivityNode> {
        let mut visited = HashSet::new();
        self.render(id, MAX_ACTIVITY_DEPTH, &mut visited)
    }

    fn render(
        &self,
        id: ActivityId,
        remaining_depth: u32,
        visited: &mut HashSet<ActivityId>,
    ) -> Option<ActivityNode> {
        let activity = self.nodes.get(&id)?;
        if !visited.insert(id) {
            return None;
        }

        let children = if remaining_depth == 0 {
            Vec::new()
        } else {
            self.child_ids(id)
                .iter()
                .filter_map(|child_id| self.render(*child_id, remaining_depth - 1, visited))
                .collect()
        };

        Some(ActivityNode {
            id: activity.id,
            name: activity.name.clone(),
            parent_id: activity.parent_id,
            children,
        })
    }
}

impl TaxonomyStore for TaxonomyIndex {
    type Error = Infallible;

    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, Infallible> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn children(&self, parent_id: ActivityId) -> Result<Vec<Activity>, Infallible> {
        Ok(self
            .child_ids(parent_id)
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect())
    }
}
