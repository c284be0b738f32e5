//! Versioned schema for the SQLite document backend.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "documents",
        sql: include_str!("migrations/001_documents.sql"),
    },
    Migration {
        version: "002",
        name: "document_revisions",
        sql: include_str!("migrations/002_document_revisions.sql"),
    },
];

/// Brings the schema up to date. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    if is_untracked_store(conn)? {
        record(conn, &MIGRATIONS[0])?;
        tracing::info!("Adopted untracked documents table as migration 001");
    }

    for migration in MIGRATIONS {
        if !is_applied(conn, migration.version)? {
            apply(conn, migration)?;
        }
    }

    Ok(())
}

/// A `documents` table that exists while nothing has been recorded yet.
fn is_untracked_store(conn: &Connection) -> Result<bool> {
    let recorded: i64 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))?;
    if recorded > 0 {
        return Ok(false);
    }

    let documents: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(documents.is_some())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT version FROM schema_migrations WHERE version = ?",
            [version],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
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

/// Runs the migration and records it in one transaction.
fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(version = migration.version, name = migration.name, "Applying migration");

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql).with_context(|| {
        format!(
            "Failed to apply migration {}: {}",
            migration.version, migration.name
        )
    })?;
    record(&tx, migration)?;
    tx.commit()?;

    Ok(())
}
