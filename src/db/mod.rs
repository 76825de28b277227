//! SQLite persistence layer.
//!
//! Raw SQL with rusqlite, no ORM. Repositories operate on a borrowed
//! `Connection`; the async `Database` handle serializes access for the
//! service side.

pub mod documents;
pub mod interviews;
pub mod users;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn init_db() -> Result<Connection> {
    let db_path = crate::global::db_file()?;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(&db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    // No uniqueness constraint on meeting_id: the accessor does
    // lookup-then-patch-or-insert, and concurrent first-writes can race.
    // Reads take the first row by insertion order.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS code_documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT '',
            output TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create code_documents table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_code_documents_meeting_id
         ON code_documents(meeting_id)",
        [],
    )
    .context("Failed to create index on meeting_id")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS interviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            start_time INTEGER NOT NULL,
            status TEXT NOT NULL,
            stream_call_id TEXT NOT NULL,
            candidate_id TEXT NOT NULL,
            interviewer_ids TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create interviews table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_interviews_status ON interviews(status)",
        [],
    )
    .context("Failed to create index on status")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            role TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create users table")?;

    Ok(())
}

/// Shared async handle over a single connection.
///
/// Writes serialize on the lock; the commit order is the observable
/// last-write-wins order for concurrent field updates.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open() -> Result<Self> {
        Ok(Self::from_connection(init_db()?))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub async fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('code_documents', 'interviews', 'users')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
    }

    #[tokio::test]
    async fn test_database_with_conn() {
        let db = Database::in_memory().unwrap();
        let count = db
            .with_conn(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM code_documents", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
