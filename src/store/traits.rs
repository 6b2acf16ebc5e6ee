use crate::sitemap::DiscoveredUrl;
use crate::store::UrlRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Store-specific errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Fingerprint collision on {fingerprint}: stored {existing_url}, rejected {new_url}")]
    FingerprintCollision {
        fingerprint: String,
        existing_url: String,
        new_url: String,
    },

    #[error("No record with fingerprint {0}")]
    RecordNotFound(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-batch counts from an upsert pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// URLs seen for the first time
    pub inserted: usize,

    /// Existing records whose last-fetched timestamp was refreshed
    pub refreshed: usize,

    /// URLs rejected, currently only on fingerprint collision
    pub failed: usize,
}

/// Persistence seam for URL crawl-state metadata
///
/// Implementations must keep the batch going past per-item rejections: one
/// colliding URL counts as failed, the rest of the batch still lands.
pub trait UrlStore {
    /// Records a batch of discovered URLs
    ///
    /// New URLs are inserted with discovery and fetch timestamps both set to
    /// `now`. Known URLs get only their last-fetched timestamp refreshed;
    /// the original discovery timestamp and depth are preserved.
    fn upsert_discovered(
        &mut self,
        urls: &[DiscoveredUrl],
        now: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome>;

    /// Returns every record that is pending dispatch
    ///
    /// Pending means never crawled, or last crawled before the last discovery
    /// observation. Ordered by discovery time so older URLs dispatch first.
    fn query_pending(&self) -> StoreResult<Vec<UrlRecord>>;

    /// Acknowledges a downstream crawl of one record
    ///
    /// Returns [`StoreError::RecordNotFound`] if the fingerprint is unknown.
    fn mark_crawled(&mut self, fingerprint: &str, now: DateTime<Utc>) -> StoreResult<()>;

    /// Looks up a single record by fingerprint
    fn get_record(&self, fingerprint: &str) -> StoreResult<Option<UrlRecord>>;

    /// Total number of stored records
    fn count_records(&self) -> StoreResult<u64>;

    /// Number of records currently pending dispatch
    fn count_pending(&self) -> StoreResult<u64>;
}
