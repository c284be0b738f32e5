use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use super::{schema, DocumentBackend};
use crate::error::StoreError;

/// A SQLite database holding every store document as one row.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        schema::run_migrations(&conn)
    }

    /// Backend for the document stored under `name`.
    pub fn document(&self, name: &'static str) -> SqliteBackend {
        SqliteBackend {
            db: self.clone(),
            name,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned("database"))
    }
}

/// One row of the `documents` table.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Database,
    name: &'static str,
}

impl DocumentBackend for SqliteBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let conn = self.db.lock()?;
        let body = conn
            .query_row(
                "SELECT body FROM documents WHERE name = ?",
                [self.name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    fn store(&self, body: &str) -> Result<(), StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let revision: i64 = tx.query_row(
            "INSERT INTO documents (name, body, updated_at, revision) VALUES (?, ?, ?, 1)
             ON CONFLICT(name) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at,
                revision = documents.revision + 1
             RETURNING revision",
            (self.name, body, Utc::now().to_rfc3339()),
            |row| row.get(0),
        )?;
        tx.commit()?;

        tracing::debug!(document = self.name, revision, "Stored document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn revision(db: &Database, name: &str) -> i64 {
        db.lock()
            .unwrap()
            .query_row(
                "SELECT revision FROM documents WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()
            .unwrap()
            .unwrap_or(0)
    }

    #[test]
    fn unknown_document_loads_as_none() {
        let db = migrated();
        assert!(db.document("recipes").load().unwrap().is_none());
    }

    #[test]
    fn store_upserts_and_counts_revisions() {
        let db = migrated();
        let backend = db.document("recipes");

        backend.store("{}").unwrap();
        backend.store(r#"{"a": 1}"#).unwrap();

        assert_eq!(backend.load().unwrap().as_deref(), Some(r#"{"a": 1}"#));
        assert_eq!(revision(&db, "recipes"), 2);
        assert_eq!(revision(&db, "meal_plan"), 0);
    }

    #[test]
    fn documents_do_not_share_rows() {
        let db = migrated();
        db.document("recipes").store(r#"{"r": 1}"#).unwrap();
        db.document("meal_plan").store(r#"{"m": 1}"#).unwrap();

        assert_eq!(
            db.document("recipes").load().unwrap().as_deref(),
            Some(r#"{"r": 1}"#)
        );
    }
}
