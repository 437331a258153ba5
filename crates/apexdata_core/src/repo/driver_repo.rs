//! Driver repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `drivers`, addressed by the natural key `driver_id`.
//!
//! # Invariants
//! - `driver_id` uniqueness is checked before insert/rename and enforced by
//!   the schema.
//! - Delete is rejected with `Conflict` while any result or qualifying entry
//!   references the driver; the schema `RESTRICT` action is the backstop.

use super::codec::{
    count_participations, format_date, format_timestamp, parse_date, parse_id, parse_timestamp,
    restamp, stamp,
};
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::driver::{Driver, DriverPatch, NewDriver};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "driver";

const DRIVER_COLUMNS: &[&str] = &[
    "id",
    "driver_id",
    "permanent_number",
    "code",
    "given_name",
    "family_name",
    "date_of_birth",
    "nationality",
    "url",
    "created_at",
    "updated_at",
];

const DRIVER_SELECT_SQL: &str = "SELECT
    id,
    driver_id,
    permanent_number,
    code,
    given_name,
    family_name,
    date_of_birth,
    nationality,
    url,
    created_at,
    updated_at
FROM drivers";

/// Repository interface for drivers.
pub trait DriverRepository {
    /// Lists drivers by family name.
    fn list_drivers(&self, window: ListWindow) -> RepoResult<Vec<Driver>>;
    /// Loads one driver by natural key.
    fn get_driver(&self, driver_id: &str) -> RepoResult<Driver>;
    /// Loads one driver by surrogate id.
    fn get_driver_by_id(&self, id: RecordId) -> RepoResult<Driver>;
    fn create_driver(&self, input: &NewDriver) -> RepoResult<Driver>;
    fn update_driver(&self, driver_id: &str, patch: &DriverPatch) -> RepoResult<Driver>;
    /// Deletes an unreferenced driver.
    fn delete_driver(&self, driver_id: &str) -> RepoResult<()>;
}

/// SQLite-backed driver repository.
pub struct SqliteDriverRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteDriverRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "drivers", DRIVER_COLUMNS)?;
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

impl DriverRepository for SqliteDriverRepository<'_> {
    fn list_drivers(&self, window: ListWindow) -> RepoResult<Vec<Driver>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DRIVER_SELECT_SQL}
             ORDER BY family_name ASC, given_name ASC, id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut drivers = Vec::new();
        while let Some(row) = rows.next()? {
            drivers.push(parse_driver_row(row)?);
        }
        Ok(drivers)
    }

    fn get_driver(&self, driver_id: &str) -> RepoResult<Driver> {
        load_driver(self.conn, "driver_id", driver_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, driver_id))
    }

    fn get_driver_by_id(&self, id: RecordId) -> RepoResult<Driver> {
        load_driver(self.conn, "id", &id.to_string())?.ok_or_else(|| RepoError::not_found(ENTITY, id))
    }

    fn create_driver(&self, input: &NewDriver) -> RepoResult<Driver> {
        input.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if driver_row_id(&tx, &input.driver_id)?.is_some() {
            return Err(RepoError::conflict(
                ENTITY,
                format!("driver {} already exists", input.driver_id),
            ));
        }

        let now = stamp(self.clock.as_ref());
        let driver = Driver {
            id: new_record_id(),
            driver_id: input.driver_id.clone(),
            permanent_number: input.permanent_number,
            code: input.code.clone(),
            given_name: input.given_name.clone(),
            family_name: input.family_name.clone(),
            date_of_birth: input.date_of_birth,
            nationality: input.nationality.clone(),
            url: input.url.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO drivers (
                id,
                driver_id,
                permanent_number,
                code,
                given_name,
                family_name,
                date_of_birth,
                nationality,
                url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                driver.id.to_string(),
                driver.driver_id.as_str(),
                driver.permanent_number,
                driver.code.as_deref(),
                driver.given_name.as_str(),
                driver.family_name.as_str(),
                driver.date_of_birth.as_ref().map(format_date),
                driver.nationality.as_str(),
                driver.url.as_deref(),
                format_timestamp(&driver.created_at),
                format_timestamp(&driver.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=driver_create module=repo status=ok driver_id={} id={}",
            driver.driver_id, driver.id
        );
        Ok(driver)
    }

    fn update_driver(&self, driver_id: &str, patch: &DriverPatch) -> RepoResult<Driver> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut driver = load_driver(&tx, "driver_id", driver_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, driver_id))?;

        if let Some(new_key) = patch.driver_id.as_deref() {
            if new_key != driver.driver_id && driver_row_id(&tx, new_key)?.is_some() {
                return Err(RepoError::conflict(
                    ENTITY,
                    format!("driver {new_key} already exists"),
                ));
            }
        }

        patch.apply_to(&mut driver);
        driver.validate()?;
        driver.updated_at = restamp(self.clock.as_ref(), driver.updated_at);

        tx.execute(
            "UPDATE drivers
             SET
                driver_id = ?2,
                permanent_number = ?3,
                code = ?4,
                given_name = ?5,
                family_name = ?6,
                date_of_birth = ?7,
                nationality = ?8,
                url = ?9,
                updated_at = ?10
             WHERE id = ?1;",
            params![
                driver.id.to_string(),
                driver.driver_id.as_str(),
                driver.permanent_number,
                driver.code.as_deref(),
                driver.given_name.as_str(),
                driver.family_name.as_str(),
                driver.date_of_birth.as_ref().map(format_date),
                driver.nationality.as_str(),
                driver.url.as_deref(),
                format_timestamp(&driver.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=driver_update module=repo status=ok driver_id={} id={}",
            driver.driver_id, driver.id
        );
        Ok(driver)
    }

    fn delete_driver(&self, driver_id: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = driver_row_id(&tx, driver_id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, driver_id))?;

        let references = count_participations(&tx, "driver_id", id)?;
        if references > 0 {
            warn!(
                "event=driver_delete module=repo status=rejected driver_id={driver_id} references={references}"
            );
            return Err(RepoError::conflict(
                ENTITY,
                format!("driver {driver_id} is referenced by {references} result/qualifying rows"),
            ));
        }

        tx.execute("DELETE FROM drivers WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        tx.commit()?;

        info!("event=driver_delete module=repo status=ok driver_id={driver_id} id={id}");
        Ok(())
    }
}

/// Resolves the surrogate id for a driver natural key.
pub(crate) fn driver_row_id(conn: &Connection, driver_id: &str) -> RepoResult<Option<RecordId>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM drivers WHERE driver_id = ?1;",
            [driver_id],
            |row| row.get(0),
        )
        .optional()?;
    id.map(|value| parse_id(&value, "drivers.id")).transpose()
}

fn load_driver(
    conn: &Connection,
    key_column: &'static str,
    key: &str,
) -> RepoResult<Option<Driver>> {
    let mut stmt = conn.prepare(&format!("{DRIVER_SELECT_SQL} WHERE {key_column} = ?1;"))?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_driver_row(row)?));
    }
    Ok(None)
}

fn parse_driver_row(row: &Row<'_>) -> RepoResult<Driver> {
    let id: String = row.get("id")?;
    let date_of_birth = match row.get::<_, Option<String>>("date_of_birth")? {
        Some(value) => Some(parse_date(&value, "drivers.date_of_birth")?),
        None => None,
    };
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Driver {
        id: parse_id(&id, "drivers.id")?,
        driver_id: row.get("driver_id")?,
        permanent_number: row.get("permanent_number")?,
        code: row.get("code")?,
        given_name: row.get("given_name")?,
        family_name: row.get("family_name")?,
        date_of_birth,
        nationality: row.get("nationality")?,
        url: row.get("url")?,
        created_at: parse_timestamp(&created_at, "drivers.created_at")?,
        updated_at: parse_timestamp(&updated_at, "drivers.updated_at")?,
    })
}
