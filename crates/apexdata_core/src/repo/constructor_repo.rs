//! Constructor repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `constructor_id` is unique.
//! - Delete is rejected with `Conflict` while results or qualifying entries
//!   reference the constructor.

use super::codec::{
    count_participations, format_timestamp, parse_id, parse_timestamp, restamp, stamp,
};
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::constructor::{Constructor, ConstructorPatch, NewConstructor};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "constructor";

const CONSTRUCTOR_COLUMNS: &[&str] = &[
    "id",
    "constructor_id",
    "name",
    "nationality",
    "url",
    "created_at",
    "updated_at",
];

const CONSTRUCTOR_SELECT_SQL: &str = "SELECT
    id,
    constructor_id,
    name,
    nationality,
    url,
    created_at,
    updated_at
FROM constructors";

/// Repository interface for constructors.
pub trait ConstructorRepository {
    /// Lists constructors by name.
    fn list_constructors(&self, window: ListWindow) -> RepoResult<Vec<Constructor>>;
    fn get_constructor(&self, constructor_id: &str) -> RepoResult<Constructor>;
    fn create_constructor(&self, input: &NewConstructor) -> RepoResult<Constructor>;
    fn update_constructor(
        &self,
        constructor_id: &str,
        patch: &ConstructorPatch,
    ) -> RepoResult<Constructor>;
    fn delete_constructor(&self, constructor_id: &str) -> RepoResult<()>;
}

/// SQLite-backed constructor repository.
pub struct SqliteConstructorRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteConstructorRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "constructors", CONSTRUCTOR_COLUMNS)?;
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

impl ConstructorRepository for SqliteConstructorRepository<'_> {
    fn list_constructors(&self, window: ListWindow) -> RepoResult<Vec<Constructor>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONSTRUCTOR_SELECT_SQL}
             ORDER BY name ASC, id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut constructors = Vec::new();
        while let Some(row) = rows.next()? {
            constructors.push(parse_constructor_row(row)?);
        }
        Ok(constructors)
    }

    fn get_constructor(&self, constructor_id: &str) -> RepoResult<Constructor> {
        load_constructor(self.conn, constructor_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, constructor_id))
    }

    fn create_constructor(&self, input: &NewConstructor) -> RepoResult<Constructor> {
        input.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if constructor_row_id(&tx, &input.constructor_id)?.is_some() {
            return Err(RepoError::conflict(
                ENTITY,
                format!("constructor {} already exists", input.constructor_id),
            ));
        }

        let now = stamp(self.clock.as_ref());
        let constructor = Constructor {
            id: new_record_id(),
            constructor_id: input.constructor_id.clone(),
            name: input.name.clone(),
            nationality: input.nationality.clone(),
            url: input.url.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO constructors (
                id,
                constructor_id,
                name,
                nationality,
                url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                constructor.id.to_string(),
                constructor.constructor_id.as_str(),
                constructor.name.as_str(),
                constructor.nationality.as_str(),
                constructor.url.as_deref(),
                format_timestamp(&constructor.created_at),
                format_timestamp(&constructor.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=constructor_create module=repo status=ok constructor_id={} id={}",
            constructor.constructor_id, constructor.id
        );
        Ok(constructor)
    }

    fn update_constructor(
        &self,
        constructor_id: &str,
        patch: &ConstructorPatch,
    ) -> RepoResult<Constructor> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut constructor = load_constructor(&tx, constructor_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, constructor_id))?;

        if let Some(new_key) = patch.constructor_id.as_deref() {
            if new_key != constructor.constructor_id && constructor_row_id(&tx, new_key)?.is_some()
            {
                return Err(RepoError::conflict(
                    ENTITY,
                    format!("constructor {new_key} already exists"),
                ));
            }
        }

        patch.apply_to(&mut constructor);
        constructor.validate()?;
        constructor.updated_at = restamp(self.clock.as_ref(), constructor.updated_at);

        tx.execute(
            "UPDATE constructors
             SET
                constructor_id = ?2,
                name = ?3,
                nationality = ?4,
                url = ?5,
                updated_at = ?6
             WHERE id = ?1;",
            params![
                constructor.id.to_string(),
                constructor.constructor_id.as_str(),
                constructor.name.as_str(),
                constructor.nationality.as_str(),
                constructor.url.as_deref(),
                format_timestamp(&constructor.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=constructor_update module=repo status=ok constructor_id={} id={}",
            constructor.constructor_id, constructor.id
        );
        Ok(constructor)
    }

    fn delete_constructor(&self, constructor_id: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = constructor_row_id(&tx, constructor_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, constructor_id))?;

        let references = count_participations(&tx, "constructor_id", id)?;
        if references > 0 {
            warn!(
                "event=constructor_delete module=repo status=rejected constructor_id={constructor_id} references={references}"
            );
            return Err(RepoError::conflict(
                ENTITY,
                format!(
                    "constructor {constructor_id} is referenced by {references} result/qualifying rows"
                ),
            ));
        }

        tx.execute("DELETE FROM constructors WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=constructor_delete module=repo status=ok constructor_id={constructor_id} id={id}"
        );
        Ok(())
    }
}

fn constructor_row_id(conn: &Connection, constructor_id: &str) -> RepoResult<Option<RecordId>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM constructors WHERE constructor_id = ?1;",
            [constructor_id],
            |row| row.get(0),
        )
        .optional()?;
    id.map(|value| parse_id(&value, "constructors.id")).transpose()
}

fn load_constructor(conn: &Connection, constructor_id: &str) -> RepoResult<Option<Constructor>> {
    let mut stmt = conn.prepare(&format!(
        "{CONSTRUCTOR_SELECT_SQL} WHERE constructor_id = ?1;"
    ))?;
    let mut rows = stmt.query([constructor_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_constructor_row(row)?));
    }
    Ok(None)
}

fn parse_constructor_row(row: &Row<'_>) -> RepoResult<Constructor> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(Constructor {
        id: parse_id(&id, "constructors.id")?,
        constructor_id: row.get("constructor_id")?,
        name: row.get("name")?,
        nationality: row.get("nationality")?,
        url: row.get("url")?,
        created_at: parse_timestamp(&created_at, "constructors.created_at")?,
        updated_at: parse_timestamp(&updated_at, "constructors.updated_at")?,
    })
}
