//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Compile visibility scopes into single indexed SQL statements.
//!
//! # Invariants
//! - Repositories reject connections that are not fully migrated.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod directory_repo;
pub mod message_repo;
pub mod notification_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A referenced entity does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Persisted state violates a model invariant.
    InvalidData(String),
    /// The connection has not been migrated to the expected schema.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
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

/// Verifies the connection is migrated and carries the given tables.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
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

pub(crate) fn parse_db_timestamp(
    value: &str,
    context: &'static str,
) -> RepoResult<chrono::DateTime<chrono::Utc>> {
    crate::time::parse_utc(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in {context}"))
    })
}

pub(crate) fn parse_db_bool(value: i64, context: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {context}"
        ))),
    }
}
