//! Versioned schema migrations.
//!
//! Each file under `migrations/` is applied once, inside its own
//! transaction together with its row in `schema_migrations`.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

impl Migration {
    const fn new(version: &'static str, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

const MIGRATIONS: &[Migration] = &[
    Migration::new("001", "initial", include_str!("migrations/001_initial.sql")),
    Migration::new("002", "missions", include_str!("migrations/002_missions.sql")),
    Migration::new(
        "003",
        "annotation_unlocked",
        include_str!("migrations/003_annotation_unlocked.sql"),
    ),
    Migration::new(
        "004",
        "layers_shapes",
        include_str!("migrations/004_layers_shapes.sql"),
    ),
];

/// Bring the schema up to date. Returns how many migrations were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let mut applied = applied_versions(conn)?;

    // A map table without any recorded version predates tracking
    if applied.is_empty() && table_exists(conn, "maps")? {
        record(conn, &MIGRATIONS[0])?;
        applied.insert(MIGRATIONS[0].version.to_string());
        tracing::info!("Existing database found, baselined at migration 001");
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.version))
        .collect();

    for migration in &pending {
        apply(conn, migration)?;
    }

    if !pending.is_empty() {
        tracing::info!("Schema is at migration {}", MIGRATIONS[MIGRATIONS.len() - 1].version);
    }
    Ok(pending.len())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn applied_versions(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<String>>>()?;
    Ok(versions)
}

fn record(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!("Applying migration {} ({})", migration.version, migration.name);

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
    record(&tx, migration)?;
    tx.commit()?;
    Ok(())
}
