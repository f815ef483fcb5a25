//! SQLite access for the metadata store.
//!
//! # Responsibility
//! - Open read-only connections to the metadata store.
//! - Surface schema drift (missing tables) at open time instead of at query time.
//!
//! # Invariants
//! - Connections returned from this module never write to the store.
//! - The `dataset` and `trait` tables exist on every returned connection.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_metadata_db, REQUIRED_TABLES};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store opened but lacks a table the lookups query.
    MissingTable(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingTable(table) => {
                write!(f, "metadata store has no `{table}` table")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
