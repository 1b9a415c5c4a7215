//! Organization repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist organizations with their phone and activity join rows.
//! - Answer membership filters (building, activity set, name) as id-ordered
//!   record lists.
//! - Load phones and activity links for many organizations in batches.
//!
//! # Invariants
//! - `create_organization` is atomic: phone upserts, the organization row and
//!   all join rows commit together or not at all.
//! - Phone numbers are unique by value and reused across organizations.
//! - Unknown activity ids are dropped, never rejected.
//! - A missing building is rejected by storage as `ReferentialViolation`.
//! - Bound id lists never exceed `BIND_CHUNK_SIZE` variables per statement.

use crate::model::activity::ActivityId;
use crate::model::building::BuildingId;
use crate::model::organization::{NewOrganization, OrganizationId, OrganizationRecord, Phone};
use crate::repo::{
    ensure_connection_ready, map_constraint_error, placeholders, RepoResult, BIND_CHUNK_SIZE,
};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::{HashMap, HashSet};

const ORGANIZATION_SELECT_SQL: &str = "SELECT id, name, building_id FROM organizations";

/// Membership filter for organization listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationFilter {
    All,
    InBuilding(BuildingId),
    InAnyBuilding(HashSet<BuildingId>),
    /// Organizations linked to at least one of the given activities.
    WithAnyActivity(HashSet<ActivityId>),
    /// Case-insensitive substring match on name.
    NameContains(String),
}

/// Repository interface for organization operations.
pub trait OrganizationRepository {
    /// Inserts one organization with its links and returns its id.
    fn create_organization(&self, request: &NewOrganization) -> RepoResult<OrganizationId>;
    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<OrganizationRecord>>;
    /// Lists matching organizations in ascending id order.
    fn list_organizations(
        &self,
        filter: &OrganizationFilter,
    ) -> RepoResult<Vec<OrganizationRecord>>;
    /// Phones per organization, each list ordered by phone id.
    ///
    /// Organizations without phones have no entry.
    fn list_phones_for(
        &self,
        organization_ids: &[OrganizationId],
    ) -> RepoResult<HashMap<OrganizationId, Vec<Phone>>>;
    /// Linked activity ids per organization, each list ascending.
    fn list_activity_ids_for(
        &self,
        organization_ids: &[OrganizationId],
    ) -> RepoResult<HashMap<OrganizationId, Vec<ActivityId>>>;
}

/// SQLite-backed organization repository.
pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "organizations",
                "phones",
                "organization_phones",
                "organization_activities",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(&self, request: &NewOrganization) -> RepoResult<OrganizationId> {
        let name = request.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut phone_ids = Vec::new();
        for number in request.unique_phone_numbers() {
            phone_ids.push(upsert_phone(&tx, number)?);
        }

        tx.execute(
            "INSERT INTO organizations (name, building_id) VALUES (?1, ?2);",
            params![name, request.building_id],
        )
        .map_err(|err| {
            map_constraint_error(
                err,
                format!("building {} does not exist", request.building_id),
            )
        })?;
        let organization_id = tx.last_insert_rowid();

        for phone_id in phone_ids {
            tx.execute(
                "INSERT OR IGNORE INTO organization_phones (organization_id, phone_id)
                 VALUES (?1, ?2);",
                params![organization_id, phone_id],
            )?;
        }

        // Selecting from `activities` drops ids with no stored node.
        for activity_id in request.unique_activity_ids() {
            tx.execute(
                "INSERT OR IGNORE INTO organization_activities (organization_id, activity_id)
                 SELECT ?1, id
                 FROM activities
                 WHERE id = ?2;",
                params![organization_id, activity_id],
            )?;
        }

        tx.commit()?;
        Ok(organization_id)
    }

    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<OrganizationRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{ORGANIZATION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_organization_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_organizations(
        &self,
        filter: &OrganizationFilter,
    ) -> RepoResult<Vec<OrganizationRecord>> {
        // Id sets are matched in Rust; binding them would hit the SQLite
        // variable limit on large directories.
        let linked = match filter {
            OrganizationFilter::InBuilding(building_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{ORGANIZATION_SELECT_SQL} WHERE building_id = ?1 ORDER BY id ASC;"
                ))?;
                let records = stmt
                    .query_map([building_id], parse_organization_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(records);
            }
            OrganizationFilter::InAnyBuilding(building_ids) if building_ids.is_empty() => {
                return Ok(Vec::new());
            }
            OrganizationFilter::WithAnyActivity(activity_ids) => {
                let linked = self.organization_ids_with_activities(activity_ids)?;
                if linked.is_empty() {
                    return Ok(Vec::new());
                }
                Some(linked)
            }
            _ => None,
        };

        let mut stmt = self
            .conn
            .prepare(&format!("{ORGANIZATION_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut records = stmt
            .query_map([], parse_organization_row)?
            .collect::<Result<Vec<_>, _>>()?;

        match filter {
            OrganizationFilter::InAnyBuilding(building_ids) => {
                records.retain(|record| building_ids.contains(&record.building_id));
            }
            OrganizationFilter::NameContains(text) => {
                // SQLite LIKE folds ASCII only; match in Rust to fold Cyrillic too.
                let needle = text.to_lowercase();
                records.retain(|record| record.name.to_lowercase().contains(needle.as_str()));
            }
            _ => {}
        }
        if let Some(linked) = linked {
            records.retain(|record| linked.contains(&record.id));
        }
        Ok(records)
    }

    fn list_phones_for(
        &self,
        organization_ids: &[OrganizationId],
    ) -> RepoResult<HashMap<OrganizationId, Vec<Phone>>> {
        let mut phones: HashMap<OrganizationId, Vec<Phone>> = HashMap::new();
        for chunk in organization_ids.chunks(BIND_CHUNK_SIZE) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT op.organization_id AS organization_id, p.id AS id, p.number AS number
                 FROM phones p
                 INNER JOIN organization_phones op ON op.phone_id = p.id
                 WHERE op.organization_id IN ({})
                 ORDER BY op.organization_id ASC, p.id ASC;",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((
                    row.get::<_, OrganizationId>("organization_id")?,
                    Phone {
                        id: row.get("id")?,
                        number: row.get("number")?,
                    },
                ))
            })?;
            for row in rows {
                let (organization_id, phone) = row?;
                phones.entry(organization_id).or_default().push(phone);
            }
        }
        Ok(phones)
    }

    fn list_activity_ids_for(
        &self,
        organization_ids: &[OrganizationId],
    ) -> RepoResult<HashMap<OrganizationId, Vec<ActivityId>>> {
        let mut links: HashMap<OrganizationId, Vec<ActivityId>> = HashMap::new();
        for chunk in organization_ids.chunks(BIND_CHUNK_SIZE) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT organization_id, activity_id
                 FROM organization_activities
                 WHERE organization_id IN ({})
                 ORDER BY organization_id ASC, activity_id ASC;",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((row.get::<_, OrganizationId>(0)?, row.get::<_, ActivityId>(1)?))
            })?;
            for row in rows {
                let (organization_id, activity_id) = row?;
                links.entry(organization_id).or_default().push(activity_id);
            }
        }
        Ok(links)
    }
}

impl SqliteOrganizationRepository<'_> {
    fn organization_ids_with_activities(
        &self,
        activity_ids: &HashSet<ActivityId>,
    ) -> RepoResult<HashSet<OrganizationId>> {
        let activity_ids: Vec<ActivityId> = activity_ids.iter().copied().collect();
        let mut linked = HashSet::new();
        for chunk in activity_ids.chunks(BIND_CHUNK_SIZE) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT DISTINCT organization_id
                 FROM organization_activities
                 WHERE activity_id IN ({});",
                placeholders(chunk.len())
            ))?;
            let ids = stmt.query_map(params_from_iter(chunk), |row| row.get(0))?;
            for id in ids {
                linked.insert(id?);
            }
        }
        Ok(linked)
    }
}

fn upsert_phone(conn: &Connection, number: &str) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO phones (number) VALUES (?1)
         ON CONFLICT(number) DO NOTHING;",
        [number],
    )?;
    let id = conn.query_row("SELECT id FROM phones WHERE number = ?1;", [number], |row| {
        row.get(0)
    })?;
    Ok(id)
}

fn parse_organization_row(row: &Row<'_>) -> rusqlite::Result<OrganizationRecord> {
    Ok(OrganizationRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        building_id: row.get("building_id")?,
    })
}
