use crate::dlog;
use crate::store::BlobStorage;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Blob storage in a single SQLite table, one row per key.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(db_path: &Path) -> Result<Self> {
        let display = db_path.display();
        let conn =
            Connection::open(db_path).with_context(|| format!("Opening SQLite DB: {display}"))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite DB")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        if table_exists(&conn, "blobs")? {
            dlog!("sqlite blobs table present");
        } else {
            tracing::info!("creating blobs table");
            conn.execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS blobs (
                  key         TEXT PRIMARY KEY,
                  value       TEXT NOT NULL,
                  updated_at  TEXT NOT NULL
                );
                ",
            )
            .context("Ensuring SQLite schema")?;
        }
        Ok(Self { conn })
    }
}

impl BlobStorage for SqliteStorage {
    fn write_blob(&mut self, key: &str, blob: &str) -> Result<()> {
        self.conn
            .execute(
                r"
                INSERT INTO blobs (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, blob, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Writing blob {key:?}"))?;
        Ok(())
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Reading blob {key:?}"))
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.read_blob("workouts").unwrap(), None);
    }

    #[test]
    fn write_overwrites_previous_blob() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.write_blob("workouts", "[1]").unwrap();
        storage.write_blob("workouts", "[1,2]").unwrap();
        storage.write_blob("other", "x").unwrap();
        assert_eq!(
            storage.read_blob("workouts").unwrap().as_deref(),
            Some("[1,2]")
        );
        assert_eq!(storage.read_blob("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trailmark.db");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.write_blob("workouts", "[]").unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.read_blob("workouts").unwrap().as_deref(), Some("[]"));
    }
}
