use crate::identity::{fingerprint, partition_key};
use crate::sitemap::DiscoveredUrl;
use crate::store::schema::initialize_schema;
use crate::store::traits::{StoreError, StoreResult, UpsertOutcome, UrlStore};
use crate::store::UrlRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite-backed [`UrlStore`]
pub struct SqliteStore {
    conn: Connection,
}

// Fixed-width RFC 3339 so lexicographic comparison in SQL matches time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_record(row: &Row) -> rusqlite::Result<UrlRecord> {
    let discovered_at: String = row.get(4)?;
    let last_fetched_at: String = row.get(5)?;
    let last_crawled_at: Option<String> = row.get(6)?;

    Ok(UrlRecord {
        fingerprint: row.get(0)?,
        partition_key: row.get(1)?,
        url: row.get(2)?,
        depth: row.get(3)?,
        discovered_at: parse_timestamp(4, &discovered_at)?,
        last_fetched_at: parse_timestamp(5, &last_fetched_at)?,
        last_crawled_at: match last_crawled_at {
            Some(raw) => Some(parse_timestamp(6, &raw)?),
            None => None,
        },
    })
}

const RECORD_COLUMNS: &str =
    "fingerprint, partition_key, url, depth, discovered_at, last_fetched_at, last_crawled_at";

impl SqliteStore {
    /// Opens (or creates) the database at the given path
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl UrlStore for SqliteStore {
    fn upsert_discovered(
        &mut self,
        urls: &[DiscoveredUrl],
        now: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome> {
        let now_str = format_timestamp(now);
        let mut outcome = UpsertOutcome::default();

        let tx = self.conn.transaction()?;
        {
            let mut lookup =
                tx.prepare("SELECT url FROM url_records WHERE fingerprint = ?1")?;
            let mut refresh = tx.prepare(
                "UPDATE url_records SET last_fetched_at = ?2 WHERE fingerprint = ?1",
            )?;
            let mut insert = tx.prepare(
                "INSERT INTO url_records \
                 (fingerprint, partition_key, url, depth, discovered_at, last_fetched_at, last_crawled_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, NULL)",
            )?;

            for discovered in urls {
                let fp = fingerprint(&discovered.url);
                let existing: Option<String> =
                    lookup.query_row(params![fp], |row| row.get(0)).optional()?;

                match existing {
                    Some(stored_url) if stored_url == discovered.url => {
                        refresh.execute(params![fp, now_str])?;
                        outcome.refreshed += 1;
                    }
                    Some(stored_url) => {
                        // Distinct URLs hashing to the same fingerprint are
                        // never merged; the newcomer is rejected.
                        let err = StoreError::FingerprintCollision {
                            fingerprint: fp,
                            existing_url: stored_url,
                            new_url: discovered.url.clone(),
                        };
                        tracing::warn!("Rejecting discovered URL: {}", err);
                        outcome.failed += 1;
                    }
                    None => {
                        insert.execute(params![
                            fp,
                            partition_key(&fp),
                            discovered.url,
                            discovered.depth,
                            now_str,
                        ])?;
                        outcome.inserted += 1;
                    }
                }
            }
        }
        tx.commit()?;

        Ok(outcome)
    }

    fn query_pending(&self) -> StoreResult<Vec<UrlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM url_records \
             WHERE last_crawled_at IS NULL OR last_crawled_at < last_fetched_at \
             ORDER BY discovered_at, fingerprint",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map([], map_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn mark_crawled(&mut self, fp: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let updated = self.conn.execute(
            "UPDATE url_records SET last_crawled_at = ?2 WHERE fingerprint = ?1",
            params![fp, format_timestamp(now)],
        )?;
        if updated == 0 {
            return Err(StoreError::RecordNotFound(fp.to_string()));
        }
        Ok(())
    }

    fn get_record(&self, fp: &str) -> StoreResult<Option<UrlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM url_records WHERE fingerprint = ?1",
            RECORD_COLUMNS
        ))?;
        Ok(stmt.query_row(params![fp], map_record).optional()?)
    }

    fn count_records(&self) -> StoreResult<u64> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM url_records", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_pending(&self) -> StoreResult<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM url_records \
             WHERE last_crawled_at IS NULL OR last_crawled_at < last_fetched_at",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, s).unwrap()
    }

    fn discovered(url: &str, depth: u32) -> DiscoveredUrl {
        DiscoveredUrl {
            url: url.to_string(),
            depth,
        }
    }

    #[test]
    fn test_insert_then_refresh_preserves_discovery_time() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let batch = vec![discovered("https://x/p1", 1)];

        let first = store.upsert_discovered(&batch, ts(1)).unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.refreshed, 0);

        let second = store.upsert_discovered(&batch, ts(2)).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.refreshed, 1);

        assert_eq!(store.count_records().unwrap(), 1);
        let record = store
            .get_record(&fingerprint("https://x/p1"))
            .unwrap()
            .unwrap();
        assert_eq!(record.discovered_at, ts(1));
        assert_eq!(record.last_fetched_at, ts(2));
        assert_eq!(record.last_crawled_at, None);
        assert_eq!(record.depth, 1);
        assert_eq!(record.partition_key, partition_key(&record.fingerprint));
    }

    #[test]
    fn test_pending_delta_shrinks_on_mark_crawled() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_discovered(
                &[discovered("https://x/p1", 1), discovered("https://x/p2", 1)],
                ts(1),
            )
            .unwrap();
        assert_eq!(store.count_pending().unwrap(), 2);

        store
            .mark_crawled(&fingerprint("https://x/p1"), ts(2))
            .unwrap();

        let pending = store.query_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "https://x/p2");
    }

    #[test]
    fn test_rediscovery_requeues_crawled_record() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let batch = vec![discovered("https://x/p1", 1)];

        store.upsert_discovered(&batch, ts(1)).unwrap();
        store
            .mark_crawled(&fingerprint("https://x/p1"), ts(2))
            .unwrap();
        assert_eq!(store.count_pending().unwrap(), 0);

        store.upsert_discovered(&batch, ts(3)).unwrap();
        assert_eq!(store.count_pending().unwrap(), 1);
    }

    #[test]
    fn test_mark_crawled_unknown_fingerprint() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.mark_crawled("ffffffffffffffff", ts(1));
        assert!(matches!(result, Err(StoreError::RecordNotFound(_))));
    }

    #[test]
    fn test_collision_rejected_without_overwriting() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        // A real SHA-256 collision cannot be produced, so plant a row that
        // already occupies the newcomer's fingerprint under a different URL.
        let fp = fingerprint("https://x/new");
        store
            .conn
            .execute(
                "INSERT INTO url_records VALUES (?1, ?2, ?3, 0, ?4, ?4, NULL)",
                params![fp, partition_key(&fp), "https://x/old", format_timestamp(ts(1))],
            )
            .unwrap();

        let outcome = store
            .upsert_discovered(&[discovered("https://x/new", 1)], ts(2))
            .unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.inserted, 0);

        let record = store.get_record(&fp).unwrap().unwrap();
        assert_eq!(record.url, "https://x/old");
        assert_eq!(record.last_fetched_at, ts(1));
    }

    #[test]
    fn test_batch_continues_past_collision() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let fp = fingerprint("https://x/new");
        store
            .conn
            .execute(
                "INSERT INTO url_records VALUES (?1, ?2, ?3, 0, ?4, ?4, NULL)",
                params![fp, partition_key(&fp), "https://x/old", format_timestamp(ts(1))],
            )
            .unwrap();

        let outcome = store
            .upsert_discovered(
                &[discovered("https://x/new", 1), discovered("https://x/ok", 1)],
                ts(2),
            )
            .unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.inserted, 1);
        assert!(store
            .get_record(&fingerprint("https://x/ok"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_pending_order_is_discovery_order() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_discovered(&[discovered("https://x/p2", 1)], ts(1))
            .unwrap();
        store
            .upsert_discovered(&[discovered("https://x/p1", 1)], ts(2))
            .unwrap();

        let pending = store.query_pending().unwrap();
        assert_eq!(pending[0].url, "https://x/p2");
        assert_eq!(pending[1].url, "https://x/p1");
    }

    #[test]
    fn test_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store
                .upsert_discovered(&[discovered("https://x/p1", 1)], ts(1))
                .unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.count_records().unwrap(), 1);
    }
}
