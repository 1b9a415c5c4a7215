//! Demo directory data.
//!
//! # Responsibility
//! - Populate an empty database with a small Moscow directory: five
//!   buildings, a three-root activity taxonomy, eight phones and seven
//!   organizations.
//!
//! # Invariants
//! - Seeding is skipped when any building, activity or organization exists.
//! - Seeding goes through the public services, so every create rule applies.

use crate::model::activity::{ActivityId, NewActivity};
use crate::model::building::{BuildingId, NewBuilding};
use crate::model::organization::NewOrganization;
use crate::repo::RepoResult;
use crate::service::{DirectoryResult, SqliteDirectory};
use log::info;
use rusqlite::Connection;

const BUILDINGS: &[(&str, f64, f64)] = &[
    ("г. Москва, ул. Тверская, 1", 55.7558, 37.6176),
    ("г. Москва, ул. Арбат, 15", 55.7520, 37.5934),
    ("г. Москва, ул. Ленинский проспект, 32", 55.7033, 37.5833),
    ("г. Москва, ул. Блюхера, 32/1", 55.7890, 37.6123),
    ("г. Москва, ул. Красная Площадь, 1", 55.7539, 37.6208),
];

const PHONES: &[&str] = &[
    "8-495-123-45-67",
    "8-495-234-56-78",
    "8-495-345-67-89",
    "8-495-456-78-90",
    "8-495-567-89-01",
    "8-495-678-90-12",
    "8-495-789-01-23",
    "8-495-890-12-34",
];

/// Counts of rows written by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub buildings: usize,
    pub activities: usize,
    pub organizations: usize,
    /// `true` when the database already held directory rows.
    pub skipped: bool,
}

/// Seeds the demo directory into a database with no directory rows.
pub fn seed_demo_directory(conn: &Connection) -> DirectoryResult<SeedSummary> {
    let directory = SqliteDirectory::try_new(conn)?;
    if has_directory_rows(conn)? {
        info!("event=seed module=seed status=skipped reason=not_empty");
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    let mut summary = SeedSummary::default();

    let mut building_ids: Vec<BuildingId> = Vec::with_capacity(BUILDINGS.len());
    for (address, latitude, longitude) in BUILDINGS {
        let building = directory
            .buildings
            .create_building(&NewBuilding::new(*address, *latitude, *longitude))?;
        building_ids.push(building.id);
    }
    summary.buildings = building_ids.len();

    let mut create_activity = |request: NewActivity| -> DirectoryResult<ActivityId> {
        let created = directory.activities.create_activity(&request)?;
        summary.activities += 1;
        Ok(created.id)
    };
    let food = create_activity(NewActivity::root("Еда"))?;
    let transport = create_activity(NewActivity::root("Транспорт"))?;
    let services = create_activity(NewActivity::root("Услуги"))?;
    let meat = create_activity(NewActivity::child_of(food, "Мясная продукция"))?;
    let dairy = create_activity(NewActivity::child_of(food, "Молочная продукция"))?;
    let bakery = create_activity(NewActivity::child_of(food, "Хлебобулочные изделия"))?;
    let cars = create_activity(NewActivity::child_of(transport, "Автомобили"))?;
    let trucks = create_activity(NewActivity::child_of(cars, "Грузовые"))?;
    let passenger = create_activity(NewActivity::child_of(cars, "Легковые"))?;
    let repair = create_activity(NewActivity::child_of(services, "Ремонт"))?;
    let consulting = create_activity(NewActivity::child_of(services, "Консультации"))?;

    let organizations = [
        ("ООО Рога и Копыта", 0, vec![0, 1], vec![meat, dairy]),
        ("ИП Иванов И.И.", 1, vec![2], vec![bakery]),
        ("ЗАО АвтоМир", 2, vec![3, 4], vec![cars, trucks]),
        ("ООО ТехСервис", 3, vec![5], vec![repair]),
        ("ИП Петров П.П.", 4, vec![6, 7], vec![consulting]),
        ("ООО Молочные продукты", 0, vec![0], vec![dairy]),
        ("ИП Сидоров С.С.", 1, vec![1], vec![passenger]),
    ];
    for (name, building, phones, activity_ids) in organizations {
        let request = NewOrganization {
            name: name.to_string(),
            building_id: building_ids[building],
            phone_numbers: phones
                .into_iter()
                .map(|index: usize| PHONES[index].to_string())
                .collect(),
            activity_ids,
        };
        directory.organizations.create_organization(&request)?;
        summary.organizations += 1;
    }

    info!(
        "event=seed module=seed status=ok buildings={} activities={} organizations={}",
        summary.buildings, summary.activities, summary.organizations
    );
    Ok(summary)
}

// A previous run that failed midway leaves buildings or activities behind;
// those count as non-empty too.
fn has_directory_rows(conn: &Connection) -> RepoResult<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM buildings)
             OR EXISTS(SELECT 1 FROM activities)
             OR EXISTS(SELECT 1 FROM organizations);",
        [],
        |row| row.get(0),
    )?;
    Ok(found == 1)
}
