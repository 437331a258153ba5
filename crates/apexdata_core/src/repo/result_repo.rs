//! Race result repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Results can only be created for existing race, driver and constructor
//!   rows (`InvalidReference` otherwise).
//! - Per-race listing follows `position_order ASC`; global and per-driver
//!   listing is chronological by race, then `position_order`.

use super::codec::{format_timestamp, parse_id, parse_timestamp, restamp, row_exists, stamp};
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use crate::model::result::{NewRaceResult, RaceResult, RaceResultPatch};
use log::info;
use rusqlite::{params, Connection, Row, Rows, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "result";

const RESULT_COLUMNS: &[&str] = &[
    "id",
    "race_id",
    "driver_id",
    "constructor_id",
    "number",
    "grid",
    "position",
    "position_text",
    "position_order",
    "points",
    "laps",
    "time",
    "milliseconds",
    "fastest_lap",
    "rank",
    "fastest_lap_time",
    "fastest_lap_speed",
    "status",
    "created_at",
    "updated_at",
];

const RESULT_SELECT_SQL: &str = "SELECT
    res.id AS id,
    res.race_id AS race_id,
    res.driver_id AS driver_id,
    res.constructor_id AS constructor_id,
    res.number AS number,
    res.grid AS grid,
    res.position AS position,
    res.position_text AS position_text,
    res.position_order AS position_order,
    res.points AS points,
    res.laps AS laps,
    res.time AS time,
    res.milliseconds AS milliseconds,
    res.fastest_lap AS fastest_lap,
    res.rank AS rank,
    res.fastest_lap_time AS fastest_lap_time,
    res.fastest_lap_speed AS fastest_lap_speed,
    res.status AS status,
    res.created_at AS created_at,
    res.updated_at AS updated_at
FROM results res
INNER JOIN races r ON r.id = res.race_id";

const RESULT_ORDER: &str = "r.date ASC, r.round ASC, res.position_order ASC, res.id ASC";

/// Repository interface for race results.
pub trait ResultRepository {
    fn list_results(&self, window: ListWindow) -> RepoResult<Vec<RaceResult>>;
    /// Classification of one race.
    fn list_results_for_race(&self, race_id: RecordId) -> RepoResult<Vec<RaceResult>>;
    /// Career results of one driver (surrogate id), oldest race first.
    fn list_results_for_driver(&self, driver_id: RecordId) -> RepoResult<Vec<RaceResult>>;
    fn get_result(&self, id: RecordId) -> RepoResult<RaceResult>;
    fn create_result(&self, input: &NewRaceResult) -> RepoResult<RaceResult>;
    fn update_result(&self, id: RecordId, patch: &RaceResultPatch) -> RepoResult<RaceResult>;
    fn delete_result(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed result repository.
pub struct SqliteResultRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteResultRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "results", RESULT_COLUMNS)?;
        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Results whose `column` equals `id`, in chronological order.
    fn query_results_where(
        &self,
        column: &'static str,
        id: RecordId,
    ) -> RepoResult<Vec<RaceResult>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESULT_SELECT_SQL}
             WHERE res.{column} = ?1
             ORDER BY {RESULT_ORDER};"
        ))?;
        let rows = stmt.query([id.to_string()])?;
        collect_results(rows)
    }
}

impl ResultRepository for SqliteResultRepository<'_> {
    fn list_results(&self, window: ListWindow) -> RepoResult<Vec<RaceResult>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESULT_SELECT_SQL}
             ORDER BY {RESULT_ORDER}
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        collect_results(rows)
    }

    fn list_results_for_race(&self, race_id: RecordId) -> RepoResult<Vec<RaceResult>> {
        self.query_results_where("race_id", race_id)
    }

    fn list_results_for_driver(&self, driver_id: RecordId) -> RepoResult<Vec<RaceResult>> {
        self.query_results_where("driver_id", driver_id)
    }

    fn get_result(&self, id: RecordId) -> RepoResult<RaceResult> {
        load_result(self.conn, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))
    }

    fn create_result(&self, input: &NewRaceResult) -> RepoResult<RaceResult> {
        input.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_parents_exist(
            &tx,
            ENTITY,
            input.race_id,
            input.driver_id,
            input.constructor_id,
        )?;

        let now = stamp(self.clock.as_ref());
        let result = RaceResult {
            id: new_record_id(),
            race_id: input.race_id,
            driver_id: input.driver_id,
            constructor_id: input.constructor_id,
            number: input.number,
            grid: input.grid,
            position: input.position,
            position_text: input.position_text.clone(),
            position_order: input.position_order,
            points: input.points,
            laps: input.laps,
            time: input.time.clone(),
            milliseconds: input.milliseconds,
            fastest_lap: input.fastest_lap,
            rank: input.rank,
            fastest_lap_time: input.fastest_lap_time.clone(),
            fastest_lap_speed: input.fastest_lap_speed,
            status: input.status.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO results (
                id,
                race_id,
                driver_id,
                constructor_id,
                number,
                grid,
                position,
                position_text,
                position_order,
                points,
                laps,
                time,
                milliseconds,
                fastest_lap,
                rank,
                fastest_lap_time,
                fastest_lap_speed,
                status,
                created_at,
                updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            );",
            params![
                result.id.to_string(),
                result.race_id.to_string(),
                result.driver_id.to_string(),
                result.constructor_id.to_string(),
                result.number,
                result.grid,
                result.position,
                result.position_text.as_str(),
                result.position_order,
                result.points,
                result.laps,
                result.time.as_deref(),
                result.milliseconds,
                result.fastest_lap,
                result.rank,
                result.fastest_lap_time.as_deref(),
                result.fastest_lap_speed,
                result.status.as_str(),
                format_timestamp(&result.created_at),
                format_timestamp(&result.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=result_create module=repo status=ok id={} race_id={} position_order={}",
            result.id, result.race_id, result.position_order
        );
        Ok(result)
    }

    fn update_result(&self, id: RecordId, patch: &RaceResultPatch) -> RepoResult<RaceResult> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut result = load_result(&tx, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        patch.apply_to(&mut result);
        result.validate()?;
        result.updated_at = restamp(self.clock.as_ref(), result.updated_at);

        tx.execute(
            "UPDATE results
             SET
                number = ?2,
                grid = ?3,
                position = ?4,
                position_text = ?5,
                position_order = ?6,
                points = ?7,
                laps = ?8,
                time = ?9,
                milliseconds = ?10,
                fastest_lap = ?11,
                rank = ?12,
                fastest_lap_time = ?13,
                fastest_lap_speed = ?14,
                status = ?15,
                updated_at = ?16
             WHERE id = ?1;",
            params![
                result.id.to_string(),
                result.number,
                result.grid,
                result.position,
                result.position_text.as_str(),
                result.position_order,
                result.points,
                result.laps,
                result.time.as_deref(),
                result.milliseconds,
                result.fastest_lap,
                result.rank,
                result.fastest_lap_time.as_deref(),
                result.fastest_lap_speed,
                result.status.as_str(),
                format_timestamp(&result.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!("event=result_update module=repo status=ok id={}", result.id);
        Ok(result)
    }

    fn delete_result(&self, id: RecordId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute("DELETE FROM results WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        tx.commit()?;

        info!("event=result_delete module=repo status=ok id={id}");
        Ok(())
    }
}

/// Checks the three parents of a result or qualifying row.
pub(crate) fn ensure_parents_exist(
    conn: &Connection,
    entity: &'static str,
    race_id: RecordId,
    driver_id: RecordId,
    constructor_id: RecordId,
) -> RepoResult<()> {
    for (table, parent, id) in [
        ("races", "race", race_id),
        ("drivers", "driver", driver_id),
        ("constructors", "constructor", constructor_id),
    ] {
        if !row_exists(conn, table, id)? {
            return Err(RepoError::invalid_reference(
                entity,
                format!("{parent} {id} does not exist"),
            ));
        }
    }
    Ok(())
}

fn load_result(conn: &Connection, id: RecordId) -> RepoResult<Option<RaceResult>> {
    let mut stmt = conn.prepare(&format!("{RESULT_SELECT_SQL} WHERE res.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_result_row(row)?));
    }
    Ok(None)
}

fn collect_results(mut rows: Rows<'_>) -> RepoResult<Vec<RaceResult>> {
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        results.push(parse_result_row(row)?);
    }
    Ok(results)
}

fn parse_result_row(row: &Row<'_>) -> RepoResult<RaceResult> {
    let id: String = row.get("id")?;
    let race_id: String = row.get("race_id")?;
    let driver_id: String = row.get("driver_id")?;
    let constructor_id: String = row.get("constructor_id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(RaceResult {
        id: parse_id(&id, "results.id")?,
        race_id: parse_id(&race_id, "results.race_id")?,
        driver_id: parse_id(&driver_id, "results.driver_id")?,
        constructor_id: parse_id(&constructor_id, "results.constructor_id")?,
        number: row.get("number")?,
        grid: row.get("grid")?,
        position: row.get("position")?,
        position_text: row.get("position_text")?,
        position_order: row.get("position_order")?,
        points: row.get("points")?,
        laps: row.get("laps")?,
        time: row.get("time")?,
        milliseconds: row.get("milliseconds")?,
        fastest_lap: row.get("fastest_lap")?,
        rank: row.get("rank")?,
        fastest_lap_time: row.get("fastest_lap_time")?,
        fastest_lap_speed: row.get("fastest_lap_speed")?,
        status: row.get("status")?,
        created_at: parse_timestamp(&created_at, "results.created_at")?,
        updated_at: parse_timestamp(&updated_at, "results.updated_at")?,
    })
}
