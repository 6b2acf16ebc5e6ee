use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Queue-specific errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Publish(String),
}

/// One message for the downstream crawl stage
///
/// The field names are the wire contract with the consumer: `url` is what to
/// fetch, `rowKey` is the store fingerprint the consumer acknowledges with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub url: String,

    #[serde(rename = "rowKey")]
    pub row_key: String,
}

/// Transport seam for the downstream work queue
pub trait WorkQueue {
    fn publish(&mut self, item: &WorkItem) -> Result<(), QueueError>;
}

/// SQLite-backed [`WorkQueue`]
///
/// A plain FIFO table in its own database file, separate from the metadata
/// store so the consumer can take the queue without touching crawl state.
pub struct SqliteQueue {
    conn: Connection,
}

const QUEUE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS work_queue (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    body        TEXT NOT NULL,
    enqueued_at TEXT NOT NULL
);
"#;

impl SqliteQueue {
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(QUEUE_SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn new_in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(QUEUE_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Removes and returns the oldest message, if any
    pub fn pop_next(&mut self) -> Result<Option<WorkItem>, QueueError> {
        let tx = self.conn.transaction()?;
        let next: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, body FROM work_queue ORDER BY id LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let item = match next {
            Some((id, body)) => {
                tx.execute("DELETE FROM work_queue WHERE id = ?1", params![id])?;
                Some(serde_json::from_str(&body)?)
            }
            None => None,
        };
        tx.commit()?;
        Ok(item)
    }

    /// Number of messages currently queued
    pub fn len(&self) -> Result<u64, QueueError> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM work_queue", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }
}

impl WorkQueue for SqliteQueue {
    fn publish(&mut self, item: &WorkItem) -> Result<(), QueueError> {
        let body = serde_json::to_string(item)?;
        let enqueued_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.conn.execute(
            "INSERT INTO work_queue (body, enqueued_at) VALUES (?1, ?2)",
            params![body, enqueued_at],
        )?;
        Ok(())
    }
}
