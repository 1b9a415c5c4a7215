use orgatlas_core::db::open_db_in_memory;
use orgatlas_core::{
    ActivityId, BuildingId, DirectoryError, ErrorKind, NewActivity, NewBuilding, NewOrganization,
    SqliteDirectory, ValidationError,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

/// One building plus Food -> Dairy.
fn fixture(directory: &SqliteDirectory<'_>) -> (BuildingId, ActivityId, ActivityId) {
    let building = directory
        .buildings
        .create_building(&NewBuilding::new("Tverskaya 1", 55.7558, 37.6176))
        .unwrap();
    let food = directory
        .activities
        .create_activity(&NewActivity::root("Food"))
        .unwrap();
    let dairy = directory
        .activities
        .create_activity(&NewActivity::child_of(food.id, "Dairy"))
        .unwrap();
    (building.id, food.id, dairy.id)
}

#[test]
fn create_round_trips_through_lookup() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let (building_id, food, dairy) = fixture(&directory);

    let created = directory
        .organizations
        .create_organization(
            &NewOrganization::new("  Milk & Co  ", building_id)
                .with_phone("8-495-000-00-01")
                .with_activity(food),
        )
        .unwrap();

    assert_eq!(created.name, "Milk & Co");
    assert_eq!(created.building.address, "Tverskaya 1");
    assert_eq!(created.activities.len(), 1);
    assert_eq!(created.activities[0].subtree_ids(), vec![food, dairy]);

    let fetched = directory
        .organizations
        .organization_by_id(created.id)
        .unwrap()
        .expect("created organization should be readable");
    assert_eq!(fetched, created);
}

#[test]
fn phone_numbers_are_deduplicated_and_shared_by_value() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let (building_id, _, _) = fixture(&directory);

    let first = directory
        .organizations
        .create_organization(
            &NewOrganization::new("First", building_id)
                .with_phone("111")
                .with_phone("111")
                .with_phone("222"),
        )
        .unwrap();
    assert_eq!(first.phones.len(), 2);

    let second = directory
        .organizations
        .create_organization(&NewOrganization::new("Second", building_id).with_phone("222"))
        .unwrap();
    assert_eq!(second.phones.len(), 1);
    assert_eq!(second.phones[0], first.phones[1]);
    assert_eq!(count(&conn, "phones"), 2);
    assert_eq!(count(&conn, "organization_phones"), 3);
}

#[test]
fn unknown_activity_ids_are_dropped() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let (building_id, _, dairy) = fixture(&directory);

    let created = directory
        .organizations
        .create_organization(
            &NewOrganization::new("Partial", building_id)
                .with_activity(999)
                .with_activity(dairy)
                .with_activity(dairy),
        )
        .unwrap();

    assert_eq!(created.activity_ids().into_iter().collect::<Vec<_>>(), vec![dairy]);
    assert_eq!(count(&conn, "organization_activities"), 1);
}

#[test]
fn missing_building_is_a_referential_violation_and_writes_nothing() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    fixture(&directory);

    let err = directory
        .organizations
        .create_organization(&NewOrganization::new("Nowhere", 404).with_phone("333"))
        .unwrap_err();

    assert!(matches!(err, DirectoryError::ReferentialViolation(_)), "got {err}");
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(count(&conn, "organizations"), 0);
    assert_eq!(count(&conn, "phones"), 0);
}

#[test]
fn blank_name_is_rejected_before_storage() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let (building_id, _, _) = fixture(&directory);

    let err = directory
        .organizations
        .create_organization(&NewOrganization::new(" \t ", building_id).with_phone("444"))
        .unwrap_err();

    assert!(matches!(
        err,
        DirectoryError::Validation(ValidationError::BlankName("organization"))
    ));
    assert_eq!(count(&conn, "phones"), 0);
}

#[test]
fn building_create_validates_address_and_coordinates() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();

    let err = directory
        .buildings
        .create_building(&NewBuilding::new("  ", 10.0, 10.0))
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Validation(ValidationError::BlankAddress)
    ));

    let err = directory
        .buildings
        .create_building(&NewBuilding::new("Far away", 10.0, 181.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(count(&conn, "buildings"), 0);
}

#[test]
fn organization_serializes_with_nested_read_models() {
    let conn = setup();
    let directory = SqliteDirectory::try_new(&conn).unwrap();
    let (building_id, food, _) = fixture(&directory);

    let created = directory
        .organizations
        .create_organization(
            &NewOrganization::new("Json", building_id)
                .with_phone("555")
                .with_activity(food),
        )
        .unwrap();
    let value = serde_json::to_value(&created).unwrap();

    assert_eq!(value["name"], "Json");
    assert_eq!(value["building_id"], building_id);
    assert_eq!(value["building"]["address"], "Tverskaya 1");
    assert_eq!(value["building"]["latitude"], 55.7558);
    assert_eq!(value["phones"][0]["number"], "555");
    assert_eq!(value["activities"][0]["name"], "Food");
    assert!(value["activities"][0]["parent_id"].is_null());
    assert_eq!(value["activities"][0]["children"][0]["name"], "Dairy");
    assert_eq!(value["activities"][0]["children"][0]["parent_id"], food);
}

#[test]
fn create_request_deserializes_with_optional_lists() {
    let request: NewOrganization =
        serde_json::from_str(r#"{"name": "Bare", "building_id": 1}"#).unwrap();
    assert_eq!(request, NewOrganization::new("Bare", 1));
}
