//! kiosk-store — Append-only SQLite log of access events.
//!
//! The free functions take a plain `rusqlite::Connection` so they can run
//! both on the capture loop's own connection and inside a
//! `tokio_rusqlite::Connection::call` closure.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Storage format of `access_logs.timestamp` (local time, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of `access_logs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessEvent {
    pub id: i64,
    pub name: String,
    /// `None` for a face that matched no authorized person.
    pub person_id: Option<String>,
    pub timestamp: String,
    pub face_image_path: Option<String>,
}

impl AccessEvent {
    pub fn is_authorized(&self) -> bool {
        self.person_id.is_some()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            person_id: row.get(2)?,
            timestamp: row.get(3)?,
            face_image_path: row.get(4)?,
        })
    }
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS access_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            person_id TEXT,
            timestamp TEXT NOT NULL,
            face_image_path TEXT
        );",
    )
}

/// Append a row and return its id.
pub fn insert_event(
    conn: &Connection,
    name: &str,
    person_id: Option<&str>,
    timestamp: &str,
    face_image_path: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO access_logs (name, person_id, timestamp, face_image_path) VALUES (?1, ?2, ?3, ?4)",
        params![name, person_id, timestamp, face_image_path],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent first; equal timestamps come back in reverse insertion order.
pub fn fetch_events(conn: &Connection, limit: Option<usize>) -> rusqlite::Result<Vec<AccessEvent>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, name, person_id, timestamp, face_image_path
         FROM access_logs
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], AccessEvent::from_row)?;
    rows.collect()
}

pub fn fetch_event(conn: &Connection, id: i64) -> rusqlite::Result<Option<AccessEvent>> {
    conn.query_row(
        "SELECT id, name, person_id, timestamp, face_image_path FROM access_logs WHERE id = ?1",
        params![id],
        AccessEvent::from_row,
    )
    .optional()
}

/// Owned connection used by the capture loop.
pub struct AccessStore {
    conn: Connection,
}

impl AccessStore {
    /// Open (or create) the database file, creating its parent directory.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        tracing::info!(path = %path.display(), "access log opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Record an access stamped with the current local time.
    pub fn record(
        &self,
        name: &str,
        person_id: Option<&str>,
        face_image_path: Option<&str>,
    ) -> Result<i64, StoreError> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let id = insert_event(&self.conn, name, person_id, &timestamp, face_image_path)?;
        tracing::debug!(id, name, timestamp = %timestamp, "access recorded");
        Ok(id)
    }

    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<AccessEvent>, StoreError> {
        Ok(fetch_events(&self.conn, limit)?)
    }

    pub fn get(&self, id: i64) -> Result<Option<AccessEvent>, StoreError> {
        Ok(fetch_event(&self.conn, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_fetch_orders_by_timestamp_then_id() {
        let conn = memory_conn();
        insert_event(&conn, "old", Some("1"), "2024-01-01 08:00:00.000000", None).unwrap();
        insert_event(&conn, "tie-a", Some("2"), "2024-01-02 09:00:00.000000", None).unwrap();
        insert_event(&conn, "tie-b", None, "2024-01-02 09:00:00.000000", None).unwrap();
        insert_event(&conn, "mid", Some("3"), "2024-01-01 12:00:00.000000", None).unwrap();

        let names: Vec<String> = fetch_events(&conn, None).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["tie-b", "tie-a", "mid", "old"]);
    }

    #[test]
    fn test_fetch_limit() {
        let conn = memory_conn();
        for i in 0..5 {
            insert_event(&conn, &format!("p{i}"), None, &format!("2024-01-01 00:00:0{i}"), None).unwrap();
        }
        let events = fetch_events(&conn, Some(2)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "p4");
        assert_eq!(fetch_events(&conn, Some(0)).unwrap().len(), 0);
    }

    #[test]
    fn test_record_stores_nullable_fields() {
        let store = AccessStore::open_in_memory().unwrap();
        let known = store.record("Carlos", Some("Carlos"), Some("/faces/Carlos_ab12cd34.jpg")).unwrap();
        let unknown = store.record("unknown", None, None).unwrap();

        let event = store.get(known).unwrap().unwrap();
        assert!(event.is_authorized());
        assert_eq!(event.face_image_path.as_deref(), Some("/faces/Carlos_ab12cd34.jpg"));

        let event = store.get(unknown).unwrap().unwrap();
        assert!(!event.is_authorized());
        assert_eq!(event.face_image_path, None);
        assert!(store.get(999).unwrap().is_none());
    }

    #[test]
    fn test_record_timestamp_format() {
        let store = AccessStore::open_in_memory().unwrap();
        let id = store.record("Ana", Some("7"), None).unwrap();
        let event = store.get(id).unwrap().unwrap();

        assert_eq!(event.timestamp.len(), "2024-01-01 00:00:00.000000".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&event.timestamp, "%Y-%m-%d %H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("access.db");
        let store = AccessStore::open(&path).unwrap();
        store.record("Ana", Some("7"), None).unwrap();
        drop(store);

        let reopened = AccessStore::open(&path).unwrap();
        assert_eq!(reopened.recent(None).unwrap().len(), 1);
    }
}
