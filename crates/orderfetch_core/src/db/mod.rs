//! SQLite storage bootstrap for the order store.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing the order store.
//! - Apply the order schema migrations before any read happens.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - The fetch engine never sees a connection whose schema is not current.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod seed;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Fixture data violates an order invariant.
    InvalidFixture(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "order store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidFixture(message) => write!(f, "invalid order fixture: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::InvalidFixture(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
