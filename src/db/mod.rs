//! SQLite persistence for map entities and the mission graph.
//!
//! A single connection is shared behind a mutex, so every operation runs
//! with exclusive access. Operations that touch more than one row go
//! through [`Database::transaction`], which either commits everything or
//! rolls back on the first error.

mod dependencies;
mod entities;
mod links;
mod missions;
mod progression;
mod schema;
mod transfer;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use crate::error::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let applied = schema::run_migrations(&conn)?;
        tracing::debug!("{} migrations applied", applied);
        Ok(())
    }

    /// Run `f` inside a transaction. Commits when `f` succeeds, rolls back
    /// otherwise. Also used for multi-query reads so they see one snapshot.
    pub(crate) fn transaction<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Default database location (`<data_dir>/worldnotes.db`).
pub fn default_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "worldnotes")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("worldnotes.db"))
}

/// Whether a row with `id` exists in `table`.
///
/// `table` is always one of the crate's own table names, never user input.
fn row_exists(conn: &Connection, table: &str, id: Uuid) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?", table),
            [id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_meta(s: Option<String>) -> Option<serde_json::Value> {
    s.and_then(|json| serde_json::from_str(&json).ok())
}

fn meta_to_json(meta: &Option<serde_json::Value>) -> Result<Option<String>> {
    Ok(match meta {
        Some(value) if !value.is_null() => Some(serde_json::to_string(value)?),
        _ => None,
    })
}
