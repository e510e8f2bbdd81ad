//! SQLite backend: one row per site, the document stored as JSON text.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;

use crate::errors::BackendError;

use super::backend::{Backend, Document};


pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) a database file and ensure the table exists.
    pub fn open(path: &Path) -> Result<SqliteBackend, BackendError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<SqliteBackend, BackendError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<SqliteBackend, BackendError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sites (
                name TEXT PRIMARY KEY,
                doc  TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteBackend { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, BackendError> {
        self.conn.lock().map_err(|_| BackendError::Poisoned)
    }
}

fn decode(key: &str, text: &str) -> Result<Document, BackendError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(BackendError::CorruptDocument(key.to_string())),
    }
}

impl Backend for SqliteBackend {
    fn insert_new(&self, key: &str, doc: Document) -> Result<bool, BackendError> {
        let text = serde_json::to_string(&doc)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO sites (name, doc) VALUES (?1, ?2)",
            params![key, text],
        )?;
        Ok(inserted == 1)
    }

    fn get(&self, key: &str) -> Result<Option<Document>, BackendError> {
        let conn = self.lock()?;
        let text: Option<String> = conn
            .query_row("SELECT doc FROM sites WHERE name = ?1", params![key], |row| row.get(0))
            .optional()?;
        text.map(|t| decode(key, &t)).transpose()
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM sites ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn scan(&self) -> Result<Vec<Document>, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name, doc FROM sites ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (name, text) = row?;
            docs.push(decode(&name, &text)?);
        }
        Ok(docs)
    }

    fn update(
        &self,
        key: &str,
        apply: &dyn Fn(&mut Document),
    ) -> Result<Option<Document>, BackendError> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so no other connection can
        // slip a write between our read and our write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let text: Option<String> = tx
            .query_row("SELECT doc FROM sites WHERE name = ?1", params![key], |row| row.get(0))
            .optional()?;
        let Some(text) = text else {
            return Ok(None);
        };
        let mut doc = decode(key, &text)?;
        apply(&mut doc);
        tx.execute(
            "UPDATE sites SET doc = ?2 WHERE name = ?1",
            params![key, serde_json::to_string(&doc)?],
        )?;
        tx.commit()?;
        Ok(Some(doc))
    }

    fn delete(&self, key: &str) -> Result<usize, BackendError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM sites WHERE name = ?1", params![key])?)
    }
}
