//! Database management for debug feature overrides
//!
//! Uses SQLite to persist feature flag overrides between runs

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Lock error")]
    LockError,
}

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize database tables
    fn init(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS feature_overrides (
                feature_key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Stored override for a feature, if any
    pub fn get_override(&self, feature_key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        let value = conn
            .query_row(
                "SELECT value FROM feature_overrides WHERE feature_key = ?",
                [feature_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store an override, replacing any previous one
    pub fn set_override(&self, feature_key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        conn.execute(
            "INSERT OR REPLACE INTO feature_overrides (feature_key, value) VALUES (?, ?)",
            params![feature_key, value],
        )?;
        Ok(())
    }

    /// Drop the override so the default applies again
    pub fn clear_override(&self, feature_key: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        conn.execute(
            "DELETE FROM feature_overrides WHERE feature_key = ?",
            [feature_key],
        )?;
        Ok(())
    }
}
