//! Repository layer: the query interface over the relational schema.
//!
//! # Responsibility
//! - Define one use-case oriented data access contract per record type.
//! - Translate storage constraint failures into caller-visible outcomes.
//! - Isolate SQLite query details from services and the API layer.
//!
//! # Invariants
//! - Every write runs in a single `IMMEDIATE` transaction; a failed write
//!   leaves the store unchanged.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`,
//!   `InvalidReference`) in addition to DB transport errors.
//! - Write paths validate input before any SQL mutation.

mod codec;
pub mod constructor_repo;
pub mod driver_repo;
pub mod qualifying_repo;
pub mod race_repo;
pub mod result_repo;
pub mod season_repo;

use crate::db::migrations::latest_version;
use crate::db::{ConstraintKind, DbError};
use crate::model::validation::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Input or patched record failed field validation.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Lookup target is absent.
    NotFound { entity: &'static str, key: String },
    /// Natural key already taken, or delete blocked by dependent rows.
    Conflict { entity: &'static str, reason: String },
    /// A foreign key points at a parent that does not exist.
    InvalidReference {
        entity: &'static str,
        reference: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, key: impl Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn conflict(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_reference(entity: &'static str, reference: impl Into<String>) -> Self {
        Self::InvalidReference {
            entity,
            reference: reference.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} {key} not found"),
            Self::Conflict { entity, reason } => write!(f, "{entity} conflict: {reason}"),
            Self::InvalidReference { entity, reference } => {
                write!(f, "{entity} has invalid reference: {reference}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Skip/limit window for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    pub skip: u32,
    pub limit: u32,
}

impl ListWindow {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

impl Default for ListWindow {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Maps a failed insert/update to the caller-visible outcome.
///
/// Unique collisions become `Conflict`; missing parents become
/// `InvalidReference`.
pub(crate) fn classify_write_error(entity: &'static str, err: rusqlite::Error) -> RepoError {
    match DbError::from(err) {
        DbError::ConstraintViolation {
            kind: ConstraintKind::Unique,
            message,
        } => RepoError::conflict(entity, message),
        DbError::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            message,
        } => RepoError::invalid_reference(entity, message),
        other => RepoError::Db(other),
    }
}

/// Maps a failed delete: a restrict action surfaces as `Conflict`.
pub(crate) fn classify_delete_error(entity: &'static str, err: rusqlite::Error) -> RepoError {
    match DbError::from(err) {
        DbError::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            message,
        } => RepoError::conflict(entity, format!("still referenced: {message}")),
        other => RepoError::Db(other),
    }
}

/// Verifies that `conn` is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
