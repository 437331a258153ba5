#![allow(dead_code)]

use apexdata_core::{
    Clock, Constructor, ConstructorRepository, Driver, DriverRepository, NewConstructor,
    NewDriver, NewQualifying, NewRace, NewRaceResult, NewSeason, Qualifying, QualifyingRepository,
    Race, RaceRepository, RaceResult, RecordId, ResultRepository, Season, SeasonRepository,
    SqliteConstructorRepository, SqliteDriverRepository, SqliteQualifyingRepository,
    SqliteRaceRepository, SqliteResultRepository, SqliteSeasonRepository,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Clock that advances one second on every read.
pub struct TickingClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl TickingClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ticks: AtomicI64::new(0),
        })
    }
}

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + chrono::Duration::seconds(tick)
    }
}

/// Clock that always reports the same instant.
pub struct FrozenClock(pub DateTime<Utc>);

impl FrozenClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn season(conn: &Connection, year: i32) -> Season {
    SqliteSeasonRepository::try_new(conn)
        .unwrap()
        .create_season(&NewSeason::new(year))
        .unwrap()
}

pub fn new_race(season_id: RecordId, round: i32, name: &str, on: NaiveDate) -> NewRace {
    NewRace {
        season_id,
        round,
        race_name: name.to_string(),
        circuit_id: name.to_ascii_lowercase().replace(' ', "_"),
        circuit_name: format!("{name} Circuit"),
        locality: "Somewhere".to_string(),
        country: "Somewhere".to_string(),
        date: on,
        time: None,
        url: None,
    }
}

pub fn race(conn: &Connection, season_id: RecordId, round: i32, name: &str, on: NaiveDate) -> Race {
    SqliteRaceRepository::try_new(conn)
        .unwrap()
        .create_race(&new_race(season_id, round, name, on))
        .unwrap()
}

pub fn driver(conn: &Connection, driver_id: &str, given: &str, family: &str) -> Driver {
    SqliteDriverRepository::try_new(conn)
        .unwrap()
        .create_driver(&NewDriver::new(driver_id, given, family, "British"))
        .unwrap()
}

pub fn constructor(conn: &Connection, constructor_id: &str, name: &str) -> Constructor {
    SqliteConstructorRepository::try_new(conn)
        .unwrap()
        .create_constructor(&NewConstructor::new(constructor_id, name, "Italian"))
        .unwrap()
}

pub fn new_result(
    race: &Race,
    driver: &Driver,
    constructor: &Constructor,
    position_order: i32,
) -> NewRaceResult {
    NewRaceResult {
        race_id: race.id,
        driver_id: driver.id,
        constructor_id: constructor.id,
        number: 44,
        grid: position_order,
        position: Some(position_order),
        position_text: position_order.to_string(),
        position_order,
        points: 0.0,
        laps: 57,
        time: None,
        milliseconds: None,
        fastest_lap: None,
        rank: None,
        fastest_lap_time: None,
        fastest_lap_speed: None,
        status: "Finished".to_string(),
    }
}

pub fn result(
    conn: &Connection,
    race: &Race,
    driver: &Driver,
    constructor: &Constructor,
    position_order: i32,
) -> RaceResult {
    SqliteResultRepository::try_new(conn)
        .unwrap()
        .create_result(&new_result(race, driver, constructor, position_order))
        .unwrap()
}

pub fn new_qualifying(
    race: &Race,
    driver: &Driver,
    constructor: &Constructor,
    position: i32,
) -> NewQualifying {
    NewQualifying {
        race_id: race.id,
        driver_id: driver.id,
        constructor_id: constructor.id,
        number: 16,
        position,
        q1: Some("1:30.031".to_string()),
        q2: None,
        q3: None,
    }
}

pub fn qualifying(
    conn: &Connection,
    race: &Race,
    driver: &Driver,
    constructor: &Constructor,
    position: i32,
) -> Qualifying {
    SqliteQualifyingRepository::try_new(conn)
        .unwrap()
        .create_qualifying(&new_qualifying(race, driver, constructor, position))
        .unwrap()
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}
