//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for concepts, link
//!   names and links.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories only accept connections migrated to `latest_version()`.
//! - Multi-statement writes run inside one `BEGIN IMMEDIATE` transaction.
//! - Repository APIs return semantic errors (`*NotFound`, `PairInUse`) in
//!   addition to DB transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::concept::ConceptId;
use crate::model::link::LinkId;
use crate::model::link_name::{LinkNamePairId, LinkNameValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod concept_repo;
pub mod link_name_repo;
pub mod link_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all graph repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Labels failed model validation.
    Validation(LinkNameValidationError),
    ConceptNotFound(ConceptId),
    /// Concept exists but sits in the trash.
    ConceptTrashed(ConceptId),
    /// Concept is active; only trashed concepts can be purged.
    ConceptNotTrashed(ConceptId),
    LinkNotFound(LinkId),
    /// Link name does not exist or is tombstoned.
    LinkNameNotFound(LinkNamePairId),
    /// Link name is still referenced and no replacement was given.
    PairInUse {
        id: LinkNamePairId,
        usage_count: u64,
    },
    /// Seed link names cannot be deleted.
    DefaultPairProtected(LinkNamePairId),
    /// Replacement for a deleted link name is the link name itself.
    ReplacementIsSame(LinkNamePairId),
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
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ConceptNotFound(id) => write!(f, "concept not found: {id}"),
            Self::ConceptTrashed(id) => write!(f, "concept is in trash: {id}"),
            Self::ConceptNotTrashed(id) => write!(f, "concept is not in trash: {id}"),
            Self::LinkNotFound(id) => write!(f, "link not found: {id}"),
            Self::LinkNameNotFound(id) => write!(f, "link name not found: {id}"),
            Self::PairInUse { id, usage_count } => write!(
                f,
                "link name {id} is used by {usage_count} link(s); a replacement is required"
            ),
            Self::DefaultPairProtected(id) => {
                write!(f, "default link name cannot be deleted: {id}")
            }
            Self::ReplacementIsSame(id) => {
                write!(f, "link name {id} cannot replace itself")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "graph repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "graph repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "graph repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted graph data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<LinkNameValidationError> for RepoError {
    fn from(value: LinkNameValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Fails unless `conn` is migrated and carries `table` with `columns`.
pub(crate) fn ensure_table_ready(
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

    for column in columns {
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

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
