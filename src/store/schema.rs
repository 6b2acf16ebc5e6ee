use rusqlite::Connection;

/// Schema for the URL metadata database
///
/// Timestamps are RFC 3339 TEXT with a fixed fractional width so that SQLite's
/// string comparison agrees with time order; the pending predicate relies on
/// this. `last_crawled_at` is NULL until the downstream crawler acknowledges
/// the URL.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS url_records (
    fingerprint     TEXT PRIMARY KEY,
    partition_key   TEXT NOT NULL,
    url             TEXT NOT NULL,
    depth           INTEGER NOT NULL,
    discovered_at   TEXT NOT NULL,
    last_fetched_at TEXT NOT NULL,
    last_crawled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_url_records_partition
    ON url_records(partition_key);

CREATE INDEX IF NOT EXISTS idx_url_records_pending
    ON url_records(last_crawled_at, last_fetched_at);
"#;

/// Creates the tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
