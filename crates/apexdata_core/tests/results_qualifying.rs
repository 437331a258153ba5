mod common;

use apexdata_core::db::open_db_in_memory;
use apexdata_core::{
    new_record_id, ListWindow, QualifyingPatch, QualifyingRepository, RaceResultPatch,
    RaceService, RepoError, ResultRepository, SqliteQualifyingRepository, SqliteRaceRepository,
    SqliteResultRepository,
};
use common::{
    constructor, count_rows, date, driver, new_qualifying, new_result, qualifying, race, result,
    season, TickingClock,
};

#[test]
fn result_round_trips_with_optional_fields() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "max_verstappen", "Max", "Verstappen");
    let c = constructor(&conn, "red_bull", "Red Bull");

    let mut input = new_result(&r, &d, &c, 1);
    input.points = 26.0;
    input.time = Some("1:31:44.742".to_string());
    input.milliseconds = Some(5_504_742);
    input.fastest_lap = Some(39);
    input.rank = Some(1);
    input.fastest_lap_time = Some("1:32.608".to_string());
    input.fastest_lap_speed = Some(210.383);

    let repo = SqliteResultRepository::try_new(&conn).unwrap();
    let created = repo.create_result(&input).unwrap();
    let loaded = repo.get_result(created.id).unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.points, 26.0);
    assert_eq!(loaded.fastest_lap_speed, Some(210.383));
}

#[test]
fn result_with_unknown_parent_is_invalid_reference() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");
    let repo = SqliteResultRepository::try_new(&conn).unwrap();

    let mut missing_race = new_result(&r, &d, &c, 1);
    missing_race.race_id = new_record_id();
    let mut missing_driver = new_result(&r, &d, &c, 1);
    missing_driver.driver_id = new_record_id();
    let mut missing_constructor = new_result(&r, &d, &c, 1);
    missing_constructor.constructor_id = new_record_id();

    for input in [missing_race, missing_driver, missing_constructor] {
        let err = repo.create_result(&input).unwrap_err();
        assert!(matches!(
            err,
            RepoError::InvalidReference {
                entity: "result",
                ..
            }
        ));
    }
    assert_eq!(count_rows(&conn, "results"), 0);
}

#[test]
fn negative_points_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");

    let mut input = new_result(&r, &d, &c, 1);
    input.points = -1.0;
    let err = SqliteResultRepository::try_new(&conn)
        .unwrap()
        .create_result(&input)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn race_results_follow_position_order() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let c = constructor(&conn, "mercedes", "Mercedes");
    let third = driver(&conn, "russell", "George", "Russell");
    let first = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let second = driver(&conn, "bottas", "Valtteri", "Bottas");
    result(&conn, &r, &third, &c, 3);
    result(&conn, &r, &first, &c, 1);
    result(&conn, &r, &second, &c, 2);

    let repo = SqliteResultRepository::try_new(&conn).unwrap();
    let drivers: Vec<_> = repo
        .list_results_for_race(r.id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.driver_id)
        .collect();
    assert_eq!(drivers, vec![first.id, second.id, third.id]);
}

#[test]
fn driver_results_are_chronological() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let saudi = race(&conn, s.id, 2, "Saudi Arabian GP", date(2024, 3, 9));
    let bahrain = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let other = driver(&conn, "russell", "George", "Russell");
    let c = constructor(&conn, "mercedes", "Mercedes");
    result(&conn, &saudi, &d, &c, 9);
    result(&conn, &bahrain, &d, &c, 7);
    result(&conn, &bahrain, &other, &c, 5);

    let repo = SqliteResultRepository::try_new(&conn).unwrap();
    let races: Vec<_> = repo
        .list_results_for_driver(d.id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.race_id)
        .collect();
    assert_eq!(races, vec![bahrain.id, saudi.id]);

    let all = repo.list_results(ListWindow::default()).unwrap();
    let orders: Vec<i32> = all.iter().map(|entry| entry.position_order).collect();
    assert_eq!(orders, vec![5, 7, 9]);
    let page = repo.list_results(ListWindow::new(1, 1)).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].position_order, 7);
    assert!(repo.list_results(ListWindow::new(3, 10)).unwrap().is_empty());
    assert!(repo.list_results(ListWindow::new(0, 0)).unwrap().is_empty());
}

#[test]
fn result_patch_clears_time_and_keeps_parents() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");
    let clock = TickingClock::new();
    let repo = SqliteResultRepository::try_new(&conn)
        .unwrap()
        .with_clock(clock.clone());
    let mut input = new_result(&r, &d, &c, 3);
    input.time = Some("+5.123".to_string());
    let created = repo.create_result(&input).unwrap();

    let patch: RaceResultPatch =
        serde_json::from_str(r#"{"time": null, "status": "Disqualified", "position": null}"#)
            .unwrap();
    let updated = repo.update_result(created.id, &patch).unwrap();

    assert_eq!(updated.time, None);
    assert_eq!(updated.position, None);
    assert_eq!(updated.status, "Disqualified");
    assert_eq!(updated.race_id, r.id);
    assert_eq!(updated.position_order, 3);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(repo.get_result(created.id).unwrap(), updated);
}

#[test]
fn result_delete_then_not_found() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "hamilton", "Lewis", "Hamilton");
    let c = constructor(&conn, "mercedes", "Mercedes");
    let created = result(&conn, &r, &d, &c, 1);

    let repo = SqliteResultRepository::try_new(&conn).unwrap();
    repo.delete_result(created.id).unwrap();
    assert!(matches!(
        repo.get_result(created.id),
        Err(RepoError::NotFound { entity: "result", .. })
    ));
    assert!(matches!(
        repo.delete_result(created.id),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn qualifying_crud_and_race_ordering() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let c = constructor(&conn, "ferrari", "Ferrari");
    let leclerc = driver(&conn, "leclerc", "Charles", "Leclerc");
    let sainz = driver(&conn, "sainz", "Carlos", "Sainz");
    let second = qualifying(&conn, &r, &sainz, &c, 4);
    let pole = qualifying(&conn, &r, &leclerc, &c, 2);

    let repo = SqliteQualifyingRepository::try_new(&conn).unwrap();
    let order: Vec<_> = repo
        .list_qualifying_for_race(r.id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(order, vec![pole.id, second.id]);

    let patch: QualifyingPatch =
        serde_json::from_str(r#"{"position": 1, "q3": "1:29.179", "q1": null}"#).unwrap();
    let updated = repo.update_qualifying(pole.id, &patch).unwrap();
    assert_eq!(updated.position, 1);
    assert_eq!(updated.q3.as_deref(), Some("1:29.179"));
    assert_eq!(updated.q1, None);

    let err = repo
        .update_qualifying(pole.id, &QualifyingPatch {
            position: Some(0),
            ..QualifyingPatch::default()
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.get_qualifying(pole.id).unwrap(), updated);

    repo.delete_qualifying(second.id).unwrap();
    assert_eq!(repo.list_qualifying(ListWindow::default()).unwrap().len(), 1);
}

#[test]
fn qualifying_with_unknown_race_is_invalid_reference() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let d = driver(&conn, "leclerc", "Charles", "Leclerc");
    let c = constructor(&conn, "ferrari", "Ferrari");

    let mut input = new_qualifying(&r, &d, &c, 1);
    input.race_id = new_record_id();
    let err = SqliteQualifyingRepository::try_new(&conn)
        .unwrap()
        .create_qualifying(&input)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidReference {
            entity: "qualifying",
            ..
        }
    ));
}

#[test]
fn race_weekend_bundles_results_and_qualifying() {
    let conn = open_db_in_memory().unwrap();
    let s = season(&conn, 2024);
    let r = race(&conn, s.id, 1, "Bahrain GP", date(2024, 3, 2));
    let other = race(&conn, s.id, 2, "Saudi Arabian GP", date(2024, 3, 9));
    let d = driver(&conn, "leclerc", "Charles", "Leclerc");
    let c = constructor(&conn, "ferrari", "Ferrari");
    result(&conn, &r, &d, &c, 4);
    result(&conn, &other, &d, &c, 3);
    qualifying(&conn, &r, &d, &c, 2);

    let service = RaceService::new(
        SqliteRaceRepository::try_new(&conn).unwrap(),
        SqliteResultRepository::try_new(&conn).unwrap(),
        SqliteQualifyingRepository::try_new(&conn).unwrap(),
    );
    let weekend = service.race_weekend(r.id).unwrap();

    assert_eq!(weekend.race, r);
    assert_eq!(weekend.results.len(), 1);
    assert_eq!(weekend.results[0].position_order, 4);
    assert_eq!(weekend.qualifying.len(), 1);

    assert!(matches!(
        service.race_weekend(new_record_id()),
        Err(RepoError::NotFound { entity: "race", .. })
    ));
}
