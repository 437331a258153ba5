//! Race repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `races`, addressed by surrogate id.
//! - Season-scoped listing used by the season schedule lookup.
//!
//! # Invariants
//! - A race can only be created under an existing season (`InvalidReference`
//!   otherwise); its `season_id` never changes afterwards.
//! - Global listing is chronological: `date ASC, round ASC`.
//! - Season listing is `round ASC`.
//! - Deleting a race cascades to its results and qualifying entries.

use super::codec::{
    format_date, format_time, format_timestamp, parse_date, parse_id, parse_time, parse_timestamp,
    restamp, row_exists, stamp, whole_seconds,
};
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use crate::model::race::{NewRace, Race, RacePatch};
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "race";

const RACE_COLUMNS: &[&str] = &[
    "id",
    "season_id",
    "round",
    "race_name",
    "circuit_id",
    "circuit_name",
    "locality",
    "country",
    "date",
    "time",
    "url",
    "created_at",
    "updated_at",
];

const RACE_SELECT_SQL: &str = "SELECT
    id,
    season_id,
    round,
    race_name,
    circuit_id,
    circuit_name,
    locality,
    country,
    date,
    time,
    url,
    created_at,
    updated_at
FROM races";

/// Repository interface for races.
pub trait RaceRepository {
    /// Lists races chronologically.
    fn list_races(&self, window: ListWindow) -> RepoResult<Vec<Race>>;
    /// Lists all races of one season ordered by round.
    fn list_races_for_season(&self, season_id: RecordId) -> RepoResult<Vec<Race>>;
    fn get_race(&self, id: RecordId) -> RepoResult<Race>;
    fn create_race(&self, input: &NewRace) -> RepoResult<Race>;
    fn update_race(&self, id: RecordId, patch: &RacePatch) -> RepoResult<Race>;
    /// Deletes a race and, through the schema, its results and qualifying.
    fn delete_race(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed race repository.
pub struct SqliteRaceRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteRaceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "races", RACE_COLUMNS)?;
        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl RaceRepository for SqliteRaceRepository<'_> {
    fn list_races(&self, window: ListWindow) -> RepoResult<Vec<Race>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RACE_SELECT_SQL}
             ORDER BY date ASC, round ASC, id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut races = Vec::new();
        while let Some(row) = rows.next()? {
            races.push(parse_race_row(row)?);
        }
        Ok(races)
    }

    fn list_races_for_season(&self, season_id: RecordId) -> RepoResult<Vec<Race>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RACE_SELECT_SQL}
             WHERE season_id = ?1
             ORDER BY round ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([season_id.to_string()])?;
        let mut races = Vec::new();
        while let Some(row) = rows.next()? {
            races.push(parse_race_row(row)?);
        }
        Ok(races)
    }

    fn get_race(&self, id: RecordId) -> RepoResult<Race> {
        load_race(self.conn, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))
    }

    fn create_race(&self, input: &NewRace) -> RepoResult<Race> {
        input.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "seasons", input.season_id)? {
            return Err(RepoError::invalid_reference(
                ENTITY,
                format!("season {} does not exist", input.season_id),
            ));
        }

        let now = stamp(self.clock.as_ref());
        let race = Race {
            id: new_record_id(),
            season_id: input.season_id,
            round: input.round,
            race_name: input.race_name.clone(),
            circuit_id: input.circuit_id.clone(),
            circuit_name: input.circuit_name.clone(),
            locality: input.locality.clone(),
            country: input.country.clone(),
            date: input.date,
            time: input.time.map(whole_seconds),
            url: input.url.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO races (
                id,
                season_id,
                round,
                race_name,
                circuit_id,
                circuit_name,
                locality,
                country,
                date,
                time,
                url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                race.id.to_string(),
                race.season_id.to_string(),
                race.round,
                race.race_name.as_str(),
                race.circuit_id.as_str(),
                race.circuit_name.as_str(),
                race.locality.as_str(),
                race.country.as_str(),
                format_date(&race.date),
                race.time.as_ref().map(format_time),
                race.url.as_deref(),
                format_timestamp(&race.created_at),
                format_timestamp(&race.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=race_create module=repo status=ok id={} season_id={} round={}",
            race.id, race.season_id, race.round
        );
        Ok(race)
    }

    fn update_race(&self, id: RecordId, patch: &RacePatch) -> RepoResult<Race> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut race = load_race(&tx, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        patch.apply_to(&mut race);
        race.time = race.time.map(whole_seconds);
        race.validate()?;
        race.updated_at = restamp(self.clock.as_ref(), race.updated_at);

        tx.execute(
            "UPDATE races
             SET
                round = ?2,
                race_name = ?3,
                circuit_id = ?4,
                circuit_name = ?5,
                locality = ?6,
                country = ?7,
                date = ?8,
                time = ?9,
                url = ?10,
                updated_at = ?11
             WHERE id = ?1;",
            params![
                race.id.to_string(),
                race.round,
                race.race_name.as_str(),
                race.circuit_id.as_str(),
                race.circuit_name.as_str(),
                race.locality.as_str(),
                race.country.as_str(),
                format_date(&race.date),
                race.time.as_ref().map(format_time),
                race.url.as_deref(),
                format_timestamp(&race.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!("event=race_update module=repo status=ok id={}", race.id);
        Ok(race)
    }

    fn delete_race(&self, id: RecordId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute("DELETE FROM races WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        tx.commit()?;

        info!("event=race_delete module=repo status=ok id={id}");
        Ok(())
    }
}

fn load_race(conn: &Connection, id: RecordId) -> RepoResult<Option<Race>> {
    let mut stmt = conn.prepare(&format!("{RACE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_race_row(row)?));
    }
    Ok(None)
}

fn parse_race_row(row: &Row<'_>) -> RepoResult<Race> {
    let id: String = row.get("id")?;
    let season_id: String = row.get("season_id")?;
    let date: String = row.get("date")?;
    let time = match row.get::<_, Option<String>>("time")? {
        Some(value) => Some(parse_time(&value, "races.time")?),
        None => None,
    };
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Race {
        id: parse_id(&id, "races.id")?,
        season_id: parse_id(&season_id, "races.season_id")?,
        round: row.get("round")?,
        race_name: row.get("race_name")?,
        circuit_id: row.get("circuit_id")?,
        circuit_name: row.get("circuit_name")?,
        locality: row.get("locality")?,
        country: row.get("country")?,
        date: parse_date(&date, "races.date")?,
        time,
        url: row.get("url")?,
        created_at: parse_timestamp(&created_at, "races.created_at")?,
        updated_at: parse_timestamp(&updated_at, "races.updated_at")?,
    })
}
