//! Database layer for eolia.

mod appointments;
mod invoices;
mod patients;
mod profiles;
mod schema;
mod stats;

pub use schema::*;
#[allow(unused_imports)]
pub use appointments::*;
#[allow(unused_imports)]
pub use invoices::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use profiles::*;
pub use stats::*;

use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Time range already booked: {0}")]
    Conflict(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Storage format for practitioner-local timestamps. Sorts lexicographically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| DbError::Constraint(format!("Bad timestamp {:?}: {}", raw, e)))
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        debug!(path = %path.as_ref().display(), "opening database");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction, holding the write lock from the start.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"profiles".to_string()));
        assert!(tables.contains(&"patients".to_string()));
        assert!(tables.contains(&"appointments".to_string()));
        assert!(tables.contains(&"invoices".to_string()));
    }

    #[test]
    fn test_transaction_rolls_back_on_drop() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let tx = db.transaction().unwrap();
            tx.execute(
                "INSERT INTO profiles (id, email) VALUES ('p1', 'p1@example.fr')",
                [],
            )
            .unwrap();
        }
        assert!(db.get_profile("p1").unwrap().is_none());

        let tx = db.transaction().unwrap();
        tx.execute(
            "INSERT INTO profiles (id, email) VALUES ('p1', 'p1@example.fr')",
            [],
        )
        .unwrap();
        tx.commit().unwrap();
        assert!(db.get_profile("p1").unwrap().is_some());
    }

    #[test]
    fn test_timestamp_format_round_trips() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 45, 0)
            .unwrap();
        let raw = format_timestamp(ts);
        assert_eq!(raw, "2024-01-15T09:45:00");
        assert_eq!(parse_timestamp(&raw).unwrap(), ts);
        assert!(parse_timestamp("15/01/2024 09:45").is_err());
    }
}
