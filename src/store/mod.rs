//! Persistent URL metadata store
//!
//! One row per unique product URL, keyed by its fingerprint. The row tracks a
//! small lifecycle: when the URL was first discovered, when it was last seen in
//! a sitemap, and when the downstream crawler last processed it. "Pending"
//! rows are the delta the dispatcher publishes.

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{StoreError, StoreResult, UpsertOutcome, UrlStore};

use chrono::{DateTime, Utc};

/// Crawl-state metadata for one discovered URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Truncated SHA-256 of the URL string; primary key
    pub fingerprint: String,

    /// First characters of the fingerprint, kept as a shard hint
    pub partition_key: String,

    /// The URL exactly as it appeared in the sitemap
    pub url: String,

    /// Sitemap tree depth at first discovery
    pub depth: u32,

    /// Set once on insert, never updated
    pub discovered_at: DateTime<Utc>,

    /// Refreshed every time the URL is seen in a discovery pass
    pub last_fetched_at: DateTime<Utc>,

    /// Set by the downstream crawler's acknowledgement; None until then
    pub last_crawled_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Whether this record belongs to the dispatch delta
    ///
    /// A record is pending until it has been crawled at least once, and
    /// becomes pending again when a later discovery pass re-observes it.
    pub fn is_pending(&self) -> bool {
        match self.last_crawled_at {
            None => true,
            Some(crawled) => crawled < self.last_fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(fetched_s: u32, crawled_s: Option<u32>) -> UrlRecord {
        let ts = |s: u32| Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, s).unwrap();
        UrlRecord {
            fingerprint: "0f115db062b7c0dd".to_string(),
            partition_key: "0f115".to_string(),
            url: "https://example.com/".to_string(),
            depth: 1,
            discovered_at: ts(0),
            last_fetched_at: ts(fetched_s),
            last_crawled_at: crawled_s.map(ts),
        }
    }

    #[test]
    fn test_never_crawled_is_pending() {
        assert!(record(1, None).is_pending());
    }

    #[test]
    fn test_crawled_after_fetch_is_not_pending() {
        assert!(!record(1, Some(2)).is_pending());
    }

    #[test]
    fn test_rediscovered_after_crawl_is_pending_again() {
        assert!(record(3, Some(2)).is_pending());
    }
}
