//! Activity taxonomy repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist activity nodes with optional parent references.
//! - Serve the `TaxonomyStore` read contract straight from SQL.
//!
//! # Invariants
//! - Child listing is deterministic: ascending id, i.e. insertion order.
//! - Depth is not checked here; callers validate it before insert.

use crate::model::activity::{Activity, ActivityId, NewActivity};
use crate::repo::{ensure_connection_ready, map_constraint_error, RepoError, RepoResult};
use crate::taxonomy::TaxonomyStore;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT id, name, parent_id FROM activities";

/// Repository interface for activity operations.
pub trait ActivityRepository {
    /// Inserts one node and returns the stored row.
    fn create_activity(&self, request: &NewActivity) -> RepoResult<Activity>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    /// Lists the whole taxonomy in ascending id order.
    fn list_activities(&self) -> RepoResult<Vec<Activity>>;
    /// Lists direct children of one node.
    fn list_children(&self, parent_id: ActivityId) -> RepoResult<Vec<Activity>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["activities"])?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, request: &NewActivity) -> RepoResult<Activity> {
        let name = request.validate()?;
        self.conn
            .execute(
                "INSERT INTO activities (name, parent_id) VALUES (?1, ?2);",
                params![name, request.parent_id],
            )
            .map_err(|err| {
                map_constraint_error(
                    err,
                    format!(
                        "parent activity {} does not exist",
                        request.parent_id.unwrap_or_default()
                    ),
                )
            })?;
        let id = self.conn.last_insert_rowid();
        self.get_activity(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("activity {id} missing right after insert"))
        })
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        let activity = self
            .conn
            .query_row(
                &format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_activity_row,
            )
            .optional()?;
        Ok(activity)
    }

    fn list_activities(&self) -> RepoResult<Vec<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} ORDER BY id ASC;"))?;
        let activities = stmt
            .query_map([], parse_activity_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activities)
    }

    fn list_children(&self, parent_id: ActivityId) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL} WHERE parent_id = ?1 ORDER BY id ASC;"
        ))?;
        let children = stmt
            .query_map([parent_id], parse_activity_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(children)
    }
}

impl TaxonomyStore for SqliteActivityRepository<'_> {
    type Error = RepoError;

    fn activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        self.get_activity(id)
    }

    fn children(&self, parent_id: ActivityId) -> RepoResult<Vec<Activity>> {
        self.list_children(parent_id)
    }
}

fn parse_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
    })
}
