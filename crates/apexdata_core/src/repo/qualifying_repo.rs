//! Qualifying repository contracts and SQLite implementation.

use super::codec::{format_timestamp, parse_id, parse_timestamp, restamp, stamp};
use super::result_repo::ensure_parents_exist;
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use crate::model::qualifying::{NewQualifying, Qualifying, QualifyingPatch};
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "qualifying";

const QUALIFYING_COLUMNS: &[&str] = &[
    "id",
    "race_id",
    "driver_id",
    "constructor_id",
    "number",
    "position",
    "q1",
    "q2",
    "q3",
    "created_at",
    "updated_at",
];

const QUALIFYING_SELECT_SQL: &str = "SELECT
    q.id AS id,
    q.race_id AS race_id,
    q.driver_id AS driver_id,
    q.constructor_id AS constructor_id,
    q.number AS number,
    q.position AS position,
    q.q1 AS q1,
    q.q2 AS q2,
    q.q3 AS q3,
    q.created_at AS created_at,
    q.updated_at AS updated_at
FROM qualifying q";

/// Repository interface for qualifying entries.
pub trait QualifyingRepository {
    /// Lists entries chronologically by race, then grid position.
    fn list_qualifying(&self, window: ListWindow) -> RepoResult<Vec<Qualifying>>;
    /// Qualifying order of one race, pole first.
    fn list_qualifying_for_race(&self, race_id: RecordId) -> RepoResult<Vec<Qualifying>>;
    fn get_qualifying(&self, id: RecordId) -> RepoResult<Qualifying>;
    fn create_qualifying(&self, input: &NewQualifying) -> RepoResult<Qualifying>;
    fn update_qualifying(&self, id: RecordId, patch: &QualifyingPatch) -> RepoResult<Qualifying>;
    fn delete_qualifying(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed qualifying repository.
pub struct SqliteQualifyingRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteQualifyingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "qualifying", QUALIFYING_COLUMNS)?;
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

impl QualifyingRepository for SqliteQualifyingRepository<'_> {
    fn list_qualifying(&self, window: ListWindow) -> RepoResult<Vec<Qualifying>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUALIFYING_SELECT_SQL}
             INNER JOIN races r ON r.id = q.race_id
             ORDER BY r.date ASC, r.round ASC, q.position ASC, q.id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_qualifying_row(row)?);
        }
        Ok(entries)
    }

    fn list_qualifying_for_race(&self, race_id: RecordId) -> RepoResult<Vec<Qualifying>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUALIFYING_SELECT_SQL}
             WHERE q.race_id = ?1
             ORDER BY q.position ASC, q.id ASC;"
        ))?;
        let mut rows = stmt.query([race_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_qualifying_row(row)?);
        }
        Ok(entries)
    }

    fn get_qualifying(&self, id: RecordId) -> RepoResult<Qualifying> {
        load_qualifying(self.conn, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))
    }

    fn create_qualifying(&self, input: &NewQualifying) -> RepoResult<Qualifying> {
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
        let entry = Qualifying {
            id: new_record_id(),
            race_id: input.race_id,
            driver_id: input.driver_id,
            constructor_id: input.constructor_id,
            number: input.number,
            position: input.position,
            q1: input.q1.clone(),
            q2: input.q2.clone(),
            q3: input.q3.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO qualifying (
                id,
                race_id,
                driver_id,
                constructor_id,
                number,
                position,
                q1,
                q2,
                q3,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                entry.id.to_string(),
                entry.race_id.to_string(),
                entry.driver_id.to_string(),
                entry.constructor_id.to_string(),
                entry.number,
                entry.position,
                entry.q1.as_deref(),
                entry.q2.as_deref(),
                entry.q3.as_deref(),
                format_timestamp(&entry.created_at),
                format_timestamp(&entry.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=qualifying_create module=repo status=ok id={} race_id={} position={}",
            entry.id, entry.race_id, entry.position
        );
        Ok(entry)
    }

    fn update_qualifying(&self, id: RecordId, patch: &QualifyingPatch) -> RepoResult<Qualifying> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut entry =
            load_qualifying(&tx, id)?.ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        patch.apply_to(&mut entry);
        entry.validate()?;
        entry.updated_at = restamp(self.clock.as_ref(), entry.updated_at);

        tx.execute(
            "UPDATE qualifying
             SET
                number = ?2,
                position = ?3,
                q1 = ?4,
                q2 = ?5,
                q3 = ?6,
                updated_at = ?7
             WHERE id = ?1;",
            params![
                entry.id.to_string(),
                entry.number,
                entry.position,
                entry.q1.as_deref(),
                entry.q2.as_deref(),
                entry.q3.as_deref(),
                format_timestamp(&entry.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!("event=qualifying_update module=repo status=ok id={}", entry.id);
        Ok(entry)
    }

    fn delete_qualifying(&self, id: RecordId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute("DELETE FROM qualifying WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        tx.commit()?;

        info!("event=qualifying_delete module=repo status=ok id={id}");
        Ok(())
    }
}

fn load_qualifying(conn: &Connection, id: RecordId) -> RepoResult<Option<Qualifying>> {
    let mut stmt = conn.prepare(&format!("{QUALIFYING_SELECT_SQL} WHERE q.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_qualifying_row(row)?));
    }
    Ok(None)
}

fn parse_qualifying_row(row: &Row<'_>) -> RepoResult<Qualifying> {
    let id: String = row.get("id")?;
    let race_id: String = row.get("race_id")?;
    let driver_id: String = row.get("driver_id")?;
    let constructor_id: String = row.get("constructor_id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Qualifying {
        id: parse_id(&id, "qualifying.id")?,
        race_id: parse_id(&race_id, "qualifying.race_id")?,
        driver_id: parse_id(&driver_id, "qualifying.driver_id")?,
        constructor_id: parse_id(&constructor_id, "qualifying.constructor_id")?,
        number: row.get("number")?,
        position: row.get("position")?,
        q1: row.get("q1")?,
        q2: row.get("q2")?,
        q3: row.get("q3")?,
        created_at: parse_timestamp(&created_at, "qualifying.created_at")?,
        updated_at: parse_timestamp(&updated_at, "qualifying.updated_at")?,
    })
}
