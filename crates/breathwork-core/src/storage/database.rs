//! SQLite-backed key-value storage.
//!
//! Holds the free-session count and nothing else; per-breath history is not
//! recorded.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::paywall::{SessionCounter, SessionGate};

const SESSION_COUNT_KEY: &str = "breathwork_session_count";

/// SQLite database for application state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/breathwork/breathwork.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("breathwork.db"))
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Stored session count, zero if never recorded.
    ///
    /// # Errors
    /// Returns [`DatabaseError::CorruptValue`] if the stored value is not a number.
    pub fn session_count(&self) -> Result<u64> {
        self.kv_get(SESSION_COUNT_KEY)?
            .map_or(Ok(0), parse_count)
    }

    /// Increment the session count and return the new value.
    ///
    /// The read and the write share one transaction.
    pub fn increment_session_count(&mut self) -> Result<u64> {
        let tx = self.conn.transaction()?;
        let stored: Option<String> = tx
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![SESSION_COUNT_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let next = stored.map_or(Ok(0), parse_count)? + 1;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![SESSION_COUNT_KEY, next.to_string()],
        )?;
        tx.commit()?;
        Ok(next)
    }

    pub fn reset_session_count(&self) -> Result<()> {
        self.kv_set(SESSION_COUNT_KEY, "0")?;
        Ok(())
    }
}

fn parse_count(raw: String) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        DatabaseError::CorruptValue {
            key: SESSION_COUNT_KEY.to_string(),
            value: raw.clone(),
        }
        .into()
    })
}

/// [`SessionCounter`] persisted in the kv table.
pub struct SessionStore {
    db: Database,
    free_limit: u64,
}

impl SessionStore {
    pub fn new(db: Database, free_limit: u64) -> Self {
        Self { db, free_limit }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl SessionCounter for SessionStore {
    fn gate(&self) -> Result<SessionGate> {
        Ok(SessionGate::new(self.db.session_count()?, self.free_limit))
    }

    fn record_session_start(&mut self) -> Result<SessionGate> {
        let count = self.db.increment_session_count()?;
        info!(session_count = count, "session started");
        Ok(SessionGate::new(count, self.free_limit))
    }
}
