//! SQLite storage bootstrap for stored activities.
//!
//! # Responsibility
//! - Open the activity store and bring its schema up to date.
//! - Report which stage failed: connecting, migrating or querying.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A store whose schema is newer than this build is never written to.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
pub use rusqlite::Connection;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Opening the file or setting connection pragmas failed.
    Connect(rusqlite::Error),
    /// Migration `version` failed and its transaction was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The store was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    Query(rusqlite::Error),
}

impl DbError {
    /// Schema version whose migration failed, if any.
    pub fn failed_migration(&self) -> Option<u32> {
        match self {
            Self::Migration { version, .. } => Some(*version),
            _ => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "cannot open activity store: {err}"),
            Self::Migration { version, source } => {
                write!(f, "activity store migration {version:04} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "activity store schema {found} is newer than supported {supported}"
            ),
            Self::Query(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) | Self::Query(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Query(value)
    }
}
