//! Season repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `seasons`, addressed by the natural key `year`.
//!
//! # Invariants
//! - `year` uniqueness is checked before insert and enforced by the schema.
//! - Deleting a season relies on `ON DELETE CASCADE` to remove its races and,
//!   transitively, their results and qualifying entries.

use super::codec::{format_timestamp, parse_id, parse_timestamp, restamp, stamp};
use super::{
    classify_delete_error, classify_write_error, ensure_connection_ready, ListWindow, RepoError,
    RepoResult,
};
use crate::model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
use crate::model::season::{NewSeason, Season, SeasonPatch};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "season";

const SEASON_COLUMNS: &[&str] = &["id", "year", "wikipedia_url", "created_at", "updated_at"];

const SEASON_SELECT_SQL: &str = "SELECT
    id,
    year,
    wikipedia_url,
    created_at,
    updated_at
FROM seasons";

/// Repository interface for seasons.
pub trait SeasonRepository {
    /// Lists seasons, newest year first.
    fn list_seasons(&self, window: ListWindow) -> RepoResult<Vec<Season>>;
    /// Loads one season by year.
    fn get_season(&self, year: i32) -> RepoResult<Season>;
    /// Creates a season; fails with `Conflict` when the year exists.
    fn create_season(&self, input: &NewSeason) -> RepoResult<Season>;
    /// Applies a partial update to the season identified by `year`.
    fn update_season(&self, year: i32, patch: &SeasonPatch) -> RepoResult<Season>;
    /// Deletes a season together with everything it owns.
    fn delete_season(&self, year: i32) -> RepoResult<()>;
}

/// SQLite-backed season repository.
pub struct SqliteSeasonRepository<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteSeasonRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "seasons", SEASON_COLUMNS)?;
        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used for lifecycle timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl SeasonRepository for SqliteSeasonRepository<'_> {
    fn list_seasons(&self, window: ListWindow) -> RepoResult<Vec<Season>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SEASON_SELECT_SQL}
             ORDER BY year DESC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut seasons = Vec::new();
        while let Some(row) = rows.next()? {
            seasons.push(parse_season_row(row)?);
        }
        Ok(seasons)
    }

    fn get_season(&self, year: i32) -> RepoResult<Season> {
        load_season_by_year(self.conn, year)?.ok_or_else(|| RepoError::not_found(ENTITY, year))
    }

    fn create_season(&self, input: &NewSeason) -> RepoResult<Season> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if season_id_for_year(&tx, input.year)?.is_some() {
            return Err(RepoError::conflict(
                ENTITY,
                format!("season {} already exists", input.year),
            ));
        }

        let now = stamp(self.clock.as_ref());
        let season = Season {
            id: new_record_id(),
            year: input.year,
            wikipedia_url: input.wikipedia_url.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO seasons (
                id,
                year,
                wikipedia_url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                season.id.to_string(),
                season.year,
                season.wikipedia_url.as_deref(),
                format_timestamp(&season.created_at),
                format_timestamp(&season.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=season_create module=repo status=ok year={} id={}",
            season.year, season.id
        );
        Ok(season)
    }

    fn update_season(&self, year: i32, patch: &SeasonPatch) -> RepoResult<Season> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut season =
            load_season_by_year(&tx, year)?.ok_or_else(|| RepoError::not_found(ENTITY, year))?;

        if let Some(new_year) = patch.year {
            if new_year != season.year && season_id_for_year(&tx, new_year)?.is_some() {
                return Err(RepoError::conflict(
                    ENTITY,
                    format!("season {new_year} already exists"),
                ));
            }
        }

        patch.apply_to(&mut season);
        season.updated_at = restamp(self.clock.as_ref(), season.updated_at);

        tx.execute(
            "UPDATE seasons
             SET
                year = ?2,
                wikipedia_url = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![
                season.id.to_string(),
                season.year,
                season.wikipedia_url.as_deref(),
                format_timestamp(&season.updated_at),
            ],
        )
        .map_err(|err| classify_write_error(ENTITY, err))?;
        tx.commit()?;

        info!(
            "event=season_update module=repo status=ok year={} id={}",
            season.year, season.id
        );
        Ok(season)
    }

    fn delete_season(&self, year: i32) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = season_id_for_year(&tx, year)?.ok_or_else(|| RepoError::not_found(ENTITY, year))?;

        tx.execute("DELETE FROM seasons WHERE id = ?1;", [id.to_string()])
            .map_err(|err| classify_delete_error(ENTITY, err))?;
        tx.commit()?;

        info!("event=season_delete module=repo status=ok year={year} id={id}");
        Ok(())
    }
}

/// Resolves the surrogate id of the season for `year`.
pub(crate) fn season_id_for_year(conn: &Connection, year: i32) -> RepoResult<Option<RecordId>> {
    let id: Option<String> = conn
        .query_row("SELECT id FROM seasons WHERE year = ?1;", [year], |row| {
            row.get(0)
        })
        .optional()?;
    id.map(|value| parse_id(&value, "seasons.id")).transpose()
}

fn load_season_by_year(conn: &Connection, year: i32) -> RepoResult<Option<Season>> {
    let mut stmt = conn.prepare(&format!("{SEASON_SELECT_SQL} WHERE year = ?1;"))?;
    let mut rows = stmt.query([year])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_season_row(row)?));
    }
    Ok(None)
}

fn parse_season_row(row: &Row<'_>) -> RepoResult<Season> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(Season {
        id: parse_id(&id, "seasons.id")?,
        year: row.get("year")?,
        wikipedia_url: row.get("wikipedia_url")?,
        created_at: parse_timestamp(&created_at, "seasons.created_at")?,
        updated_at: parse_timestamp(&updated_at, "seasons.updated_at")?,
    })
}
