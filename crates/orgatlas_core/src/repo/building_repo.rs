//! Building repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing order is ascending building id.
//! - Coordinates are validated before insert.

use crate::model::building::{Building, BuildingId, NewBuilding};
use crate::repo::{
    ensure_connection_ready, placeholders, RepoError, RepoResult, BIND_CHUNK_SIZE,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const BUILDING_SELECT_SQL: &str = "SELECT id, address, latitude, longitude FROM buildings";

/// Repository interface for building operations.
pub trait BuildingRepository {
    /// Inserts one building and returns the stored row.
    fn create_building(&self, request: &NewBuilding) -> RepoResult<Building>;
    fn get_building(&self, id: BuildingId) -> RepoResult<Option<Building>>;
    fn list_buildings(&self) -> RepoResult<Vec<Building>>;
    /// Loads the given buildings in ascending id order; unknown ids are skipped.
    fn get_buildings(&self, ids: &[BuildingId]) -> RepoResult<Vec<Building>>;
}

/// SQLite-backed building repository.
pub struct SqliteBuildingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBuildingRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["buildings"])?;
        Ok(Self { conn })
    }
}

impl BuildingRepository for SqliteBuildingRepository<'_> {
    fn create_building(&self, request: &NewBuilding) -> RepoResult<Building> {
        let address = request.validate()?;
        self.conn.execute(
            "INSERT INTO buildings (address, latitude, longitude) VALUES (?1, ?2, ?3);",
            params![address, request.latitude, request.longitude],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_building(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("building {id} missing right after insert"))
        })
    }

    fn get_building(&self, id: BuildingId) -> RepoResult<Option<Building>> {
        let building = self
            .conn
            .query_row(
                &format!("{BUILDING_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_building_row,
            )
            .optional()?;
        Ok(building)
    }

    fn list_buildings(&self) -> RepoResult<Vec<Building>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BUILDING_SELECT_SQL} ORDER BY id ASC;"))?;
        let buildings = stmt
            .query_map([], parse_building_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(buildings)
    }

    fn get_buildings(&self, ids: &[BuildingId]) -> RepoResult<Vec<Building>> {
        let mut buildings = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BIND_CHUNK_SIZE) {
            let mut stmt = self.conn.prepare(&format!(
                "{BUILDING_SELECT_SQL} WHERE id IN ({});",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk), parse_building_row)?;
            for row in rows {
                buildings.push(row?);
            }
        }
        buildings.sort_by_key(|building| building.id);
        buildings.dedup_by_key(|building| building.id);
        Ok(buildings)
    }
}

fn parse_building_row(row: &Row<'_>) -> rusqlite::Result<Building> {
    Ok(Building {
        id: row.get("id")?,
        address: row.get("address")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
    })
}
