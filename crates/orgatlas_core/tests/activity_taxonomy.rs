use orgatlas_core::db::open_db_in_memory;
use orgatlas_core::{
    activity_level, expand_descendants, ActivityId, ActivityRepository, ActivityService,
    DirectoryError, ErrorKind, NewActivity, RepoError, SqliteActivityRepository,
    ValidationError, MAX_ACTIVITY_DEPTH,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> ActivityService<SqliteActivityRepository<'_>> {
    ActivityService::new(SqliteActivityRepository::try_new(conn).unwrap())
}

fn activity_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM activities;", [], |row| row.get(0))
        .unwrap()
}

/// Food(1) -> Dairy(2) -> Cheese(3)
fn food_chain(service: &ActivityService<SqliteActivityRepository<'_>>) -> [ActivityId; 3] {
    let food = service.create_activity(&NewActivity::root("Food")).unwrap();
    let dairy = service
        .create_activity(&NewActivity::child_of(food.id, "Dairy"))
        .unwrap();
    let cheese = service
        .create_activity(&NewActivity::child_of(dairy.id, "Cheese"))
        .unwrap();
    [food.id, dairy.id, cheese.id]
}

#[test]
fn create_lands_one_level_below_parent() {
    let conn = setup();
    let service = service(&conn);
    let [food, dairy, cheese] = food_chain(&service);

    assert_eq!(service.activity_level(food).unwrap(), Some(1));
    assert_eq!(service.activity_level(dairy).unwrap(), Some(2));
    assert_eq!(service.activity_level(cheese).unwrap(), Some(3));
    assert_eq!(service.activity_level(999).unwrap(), None);
}

#[test]
fn create_under_deepest_level_is_rejected_without_writing() {
    let conn = setup();
    let service = service(&conn);
    let [_, _, cheese] = food_chain(&service);
    let before = activity_count(&conn);

    let err = service
        .create_activity(&NewActivity::child_of(cheese, "Brie"))
        .unwrap_err();

    match &err {
        DirectoryError::Validation(ValidationError::DepthExceeded {
            parent_id,
            parent_level,
        }) => {
            assert_eq!(*parent_id, cheese);
            assert_eq!(*parent_level, MAX_ACTIVITY_DEPTH);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(activity_count(&conn), before);
}

#[test]
fn create_with_unknown_parent_is_rejected() {
    let conn = setup();
    let service = service(&conn);

    let err = service
        .create_activity(&NewActivity::child_of(77, "Orphan"))
        .unwrap_err();

    assert!(matches!(
        err,
        DirectoryError::Validation(ValidationError::UnknownParent(77))
    ));
    assert_eq!(activity_count(&conn), 0);
}

#[test]
fn create_trims_name_and_rejects_blank() {
    let conn = setup();
    let service = service(&conn);

    let created = service.create_activity(&NewActivity::root("  Food  ")).unwrap();
    assert_eq!(created.name, "Food");
    assert_eq!(created.parent_id, None);
    assert!(created.children.is_empty());

    let err = service.create_activity(&NewActivity::root("   ")).unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Validation(ValidationError::BlankName(_))
    ));
}

#[test]
fn repository_maps_missing_parent_to_referential_violation() {
    let conn = setup();
    let repo = SqliteActivityRepository::try_new(&conn).unwrap();

    let err = repo
        .create_activity(&NewActivity::child_of(5, "Orphan"))
        .unwrap_err();
    assert!(matches!(err, RepoError::ReferentialViolation(_)), "got {err}");
}

#[test]
fn descendants_expand_breadth_first_within_depth() {
    let conn = setup();
    let service = service(&conn);
    let [food, dairy, cheese] = food_chain(&service);
    let repo = SqliteActivityRepository::try_new(&conn).unwrap();

    assert_eq!(
        expand_descendants(&repo, food, 1).unwrap(),
        BTreeSet::from([dairy])
    );
    assert_eq!(
        expand_descendants(&repo, food, 2).unwrap(),
        BTreeSet::from([dairy, cheese])
    );
    assert_eq!(expand_descendants(&repo, food, 0).unwrap(), BTreeSet::new());
    assert_eq!(expand_descendants(&repo, cheese, 3).unwrap(), BTreeSet::new());
    assert_eq!(
        service.descendants(food).unwrap(),
        BTreeSet::from([dairy, cheese])
    );
}

#[test]
fn sql_store_and_in_memory_index_agree() {
    let conn = setup();
    let service = service(&conn);
    let [food, dairy, _] = food_chain(&service);
    service
        .create_activity(&NewActivity::child_of(food, "Meat"))
        .unwrap();
    service
        .create_activity(&NewActivity::child_of(dairy, "Milk"))
        .unwrap();

    let repo = SqliteActivityRepository::try_new(&conn).unwrap();
    let index = service.taxonomy().unwrap();
    for activity in repo.list_activities().unwrap() {
        assert_eq!(
            activity_level(&repo, activity.id).unwrap(),
            index.level(activity.id)
        );
        assert_eq!(
            expand_descendants(&repo, activity.id, MAX_ACTIVITY_DEPTH).unwrap(),
            index.descendants(activity.id, MAX_ACTIVITY_DEPTH)
        );
    }
}

#[test]
fn children_are_listed_in_insertion_order() {
    let conn = setup();
    let service = service(&conn);
    let food = service.create_activity(&NewActivity::root("Food")).unwrap();
    let names = ["Meat", "Dairy", "Bakery"];
    for name in names {
        service
            .create_activity(&NewActivity::child_of(food.id, name))
            .unwrap();
    }

    let repo = SqliteActivityRepository::try_new(&conn).unwrap();
    let children: Vec<String> = repo
        .list_children(food.id)
        .unwrap()
        .into_iter()
        .map(|child| child.name)
        .collect();
    assert_eq!(children, names);

    let node = service.get_activity(food.id).unwrap().unwrap();
    let rendered: Vec<&str> = node.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(rendered, names);
}

#[test]
fn list_activities_renders_every_node_with_subtree() {
    let conn = setup();
    let service = service(&conn);
    let [food, dairy, cheese] = food_chain(&service);

    let nodes = service.list_activities().unwrap();
    let ids: Vec<ActivityId> = nodes.iter().map(|node| node.id).collect();
    assert_eq!(ids, vec![food, dairy, cheese]);

    assert_eq!(nodes[0].subtree_ids(), vec![food, dairy, cheese]);
    assert_eq!(nodes[1].subtree_ids(), vec![dairy, cheese]);
    assert!(nodes[2].children.is_empty());
    assert_eq!(service.get_activity(999).unwrap(), None);
}
