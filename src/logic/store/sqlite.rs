//! SQLite-backed model store (`model_blobs` table)

use std::fs;
use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{not_found, validate_name, ModelStore};
use crate::logic::error::FaultResult;

pub struct SqliteModelStore {
    conn: Mutex<Connection>,
}

impl SqliteModelStore {
    pub fn open(path: &Path) -> FaultResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> FaultResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> FaultResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS model_blobs (
                name TEXT PRIMARY KEY,
                blob BLOB NOT NULL,
                size_bytes INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ModelStore for SqliteModelStore {
    fn save(&self, name: &str, blob: &[u8]) -> FaultResult<()> {
        validate_name(name)?;
        self.conn.lock().execute(
            "INSERT INTO model_blobs(name, blob, size_bytes, updated_at) VALUES(?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET blob = excluded.blob,
                 size_bytes = excluded.size_bytes, updated_at = excluded.updated_at",
            params![name, blob, blob.len() as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load(&self, name: &str) -> FaultResult<Vec<u8>> {
        validate_name(name)?;
        let blob: Option<Vec<u8>> = self
            .conn
            .lock()
            .query_row(
                "SELECT blob FROM model_blobs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        blob.ok_or_else(|| not_found(name))
    }

    fn exists(&self, name: &str) -> FaultResult<bool> {
        validate_name(name)?;
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM model_blobs WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn delete(&self, name: &str) -> FaultResult<bool> {
        validate_name(name)?;
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM model_blobs WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    fn list(&self) -> FaultResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM model_blobs ORDER BY name ASC")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
