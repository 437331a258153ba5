mod common;

use apexdata_core::db::open_db_in_memory;
use apexdata_core::{
    ConstructorPatch, ConstructorRepository, DriverPatch, DriverRepository, ListWindow,
    NewConstructor, NewDriver, RepoError, SqliteConstructorRepository, SqliteDriverRepository,
    ValidationError,
};
use common::{
    constructor, count_rows, date, driver, qualifying, race, result, season, FrozenClock,
    TickingClock,
};

fn hamilton() -> NewDriver {
    let mut input = NewDriver::new("hamilton", "Lewis", "Hamilton", "British");
    input.permanent_number = Some(44);
    input.code = Some("HAM".to_string());
    input.date_of_birth = Some(date(1985, 1, 7));
    input.url = Some("http://en.wikipedia.org/wiki/Lewis_Hamilton".to_string());
    input
}

#[test]
fn create_driver_then_get_by_driver_id_and_surrogate_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();

    let created = repo.create_driver(&hamilton()).unwrap();

    assert_eq!(repo.get_driver("hamilton").unwrap(), created);
    assert_eq!(repo.get_driver_by_id(created.id).unwrap(), created);
    assert!(matches!(
        repo.get_driver("senna"),
        Err(RepoError::NotFound { entity: "driver", .. })
    ));
}

#[test]
fn duplicate_driver_id_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    repo.create_driver(&hamilton()).unwrap();

    let err = repo.create_driver(&hamilton()).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "driver", .. }));
    assert_eq!(count_rows(&conn, "drivers"), 1);
}

#[test]
fn driver_code_longer_than_three_chars_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    let mut input = hamilton();
    input.code = Some("HAMI".to_string());

    let err = repo.create_driver(&input).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::TooLong { field: "code", .. })
    ));
    assert_eq!(count_rows(&conn, "drivers"), 0);
}

#[test]
fn empty_driver_code_is_stored_as_given() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    let mut input = hamilton();
    input.code = Some(String::new());

    let created = repo.create_driver(&input).unwrap();
    assert_eq!(created.code.as_deref(), Some(""));
    assert_eq!(repo.get_driver("hamilton").unwrap(), created);
}

#[test]
fn partial_code_update_leaves_other_fields_and_moves_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let clock = TickingClock::new();
    let repo = SqliteDriverRepository::try_new(&conn)
        .unwrap()
        .with_clock(clock.clone());
    let created = repo.create_driver(&hamilton()).unwrap();

    let patch: DriverPatch = serde_json::from_str(r#"{"code": "LH"}"#).unwrap();
    let updated = repo.update_driver("hamilton", &patch).unwrap();

    assert_eq!(updated.code.as_deref(), Some("LH"));
    assert_eq!(updated.given_name, created.given_name);
    assert_eq!(updated.family_name, created.family_name);
    assert_eq!(updated.permanent_number, created.permanent_number);
    assert_eq!(updated.date_of_birth, created.date_of_birth);
    assert_eq!(updated.nationality, created.nationality);
    assert_eq!(updated.url, created.url);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(repo.get_driver("hamilton").unwrap(), updated);
}

#[test]
fn explicit_null_clears_nullable_driver_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    repo.create_driver(&hamilton()).unwrap();

    let patch: DriverPatch =
        serde_json::from_str(r#"{"permanent_number": null, "url": null}"#).unwrap();
    let updated = repo.update_driver("hamilton", &patch).unwrap();

    assert_eq!(updated.permanent_number, None);
    assert_eq!(updated.url, None);
    assert_eq!(updated.code.as_deref(), Some("HAM"));
}

#[test]
fn renaming_driver_id_to_taken_key_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    repo.create_driver(&hamilton()).unwrap();
    repo.create_driver(&NewDriver::new("russell", "George", "Russell", "British"))
        .unwrap();

    let patch = DriverPatch {
        driver_id: Some("russell".to_string()),
        ..DriverPatch::default()
    };
    let err = repo.update_driver("hamilton", &patch).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { .. }));

    let rename = DriverPatch {
        driver_id: Some("lewis".to_string()),
        ..DriverPatch::default()
    };
    repo.update_driver("hamilton", &rename).unwrap();
    assert!(repo.get_driver("lewis").is_ok());
    assert!(matches!(
        repo.get_driver("hamilton"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn drivers_list_by_family_name() {
    let conn = open_db_in_memory().unwrap();
    driver(&conn, "verstappen", "Max", "Verstappen");
    driver(&conn, "alonso", "Fernando", "Alonso");
    driver(&conn, "leclerc", "Charles", "Leclerc");

    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    let names: Vec<String> = repo
        .list_drivers(ListWindow::default())
        .unwrap()
        .into_iter()
        .map(|driver| driver.family_name)
        .collect();
    assert_eq!(names, vec!["Alonso", "Leclerc", "Verstappen"]);

    assert!(repo.list_drivers(ListWindow::new(0, 0)).unwrap().is_empty());
}

#[test]
fn referenced_driver_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");
    result(&conn, &r, &d, &c, 7);

    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    let err = repo.delete_driver("hamilton").unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "driver", .. }));
    assert_eq!(count_rows(&conn, "drivers"), 1);
    assert_eq!(count_rows(&conn, "results"), 1);
}

#[test]
fn unreferenced_driver_is_deleted() {
    let conn = open_db_in_memory().unwrap();
    driver(&conn, "hamilton", "Lewis", "Hamilton");

    let repo = SqliteDriverRepository::try_new(&conn).unwrap();
    repo.delete_driver("hamilton").unwrap();
    assert!(matches!(
        repo.get_driver("hamilton"),
        Err(RepoError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete_driver("hamilton"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn storage_restrict_is_backstop_for_driver_delete() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");
    result(&conn, &r, &d, &c, 7);

    let err = conn
        .execute("DELETE FROM drivers WHERE id = ?1;", [d.id.to_string()])
        .unwrap_err();
    assert_eq!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );
}

#[test]
fn constructor_crud_by_constructor_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteConstructorRepository::try_new(&conn).unwrap();

    let created = repo
        .create_constructor(&NewConstructor::new("ferrari", "Ferrari", "Italian"))
        .unwrap();
    assert_eq!(repo.get_constructor("ferrari").unwrap(), created);

    let patch: ConstructorPatch =
        serde_json::from_str(r#"{"url": "http://en.wikipedia.org/wiki/Scuderia_Ferrari"}"#)
            .unwrap();
    let updated = repo.update_constructor("ferrari", &patch).unwrap();
    assert_eq!(updated.name, "Ferrari");
    assert!(updated.url.is_some());

    let err = repo
        .create_constructor(&NewConstructor::new("ferrari", "Scuderia", "Italian"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict { .. }));

    repo.delete_constructor("ferrari").unwrap();
    assert_eq!(count_rows(&conn, "constructors"), 0);
}

#[test]
fn constructors_list_by_name() {
    let conn = open_db_in_memory().unwrap();
    constructor(&conn, "williams", "Williams");
    constructor(&conn, "alpine", "Alpine F1 Team");
    constructor(&conn, "mclaren", "McLaren");

    let repo = SqliteConstructorRepository::try_new(&conn).unwrap();
    let names: Vec<String> = repo
        .list_constructors(ListWindow::default())
        .unwrap()
        .into_iter()
        .map(|constructor| constructor.name)
        .collect();
    assert_eq!(names, vec!["Alpine F1 Team", "McLaren", "Williams"]);
}

#[test]
fn constructor_referenced_by_qualifying_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "leclerc", "Charles", "Leclerc");
    let c = constructor(&conn, "ferrari", "Ferrari");
    qualifying(&conn, &r, &d, &c, 2);

    let repo = SqliteConstructorRepository::try_new(&conn).unwrap();
    let err = repo.delete_constructor("ferrari").unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "constructor", .. }));
    assert!(repo.get_constructor("ferrari").is_ok());
}

#[test]
fn updates_move_updated_at_forward_when_clock_stalls() {
    let conn = open_db_in_memory().unwrap();
    let drivers = SqliteDriverRepository::try_new(&conn)
        .unwrap()
        .with_clock(FrozenClock::new());
    let constructors = SqliteConstructorRepository::try_new(&conn)
        .unwrap()
        .with_clock(FrozenClock::new());

    let created = drivers.create_driver(&hamilton()).unwrap();
    let patch: DriverPatch = serde_json::from_str(r#"{"nationality": "English"}"#).unwrap();
    let first = drivers.update_driver("hamilton", &patch).unwrap();
    let second = drivers.update_driver("hamilton", &patch).unwrap();
    assert!(first.updated_at > created.updated_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(first.created_at, created.created_at);
    assert_eq!(drivers.get_driver("hamilton").unwrap(), second);

    let mercedes = constructors
        .create_constructor(&NewConstructor::new("mercedes", "Mercedes", "German"))
        .unwrap();
    let renamed = constructors
        .update_constructor(
            "mercedes",
            &ConstructorPatch {
                name: Some("Mercedes-AMG".to_string()),
                ..ConstructorPatch::default()
            },
        )
        .unwrap();
    assert!(renamed.updated_at > mercedes.updated_at);
}
