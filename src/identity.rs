//! URL identity: content-addressed fingerprints for discovered URLs
//!
//! The fingerprint is the primary key in the metadata store and must be a pure
//! function of the URL: re-discovering a URL on a later pass has to land on the
//! same record. Truncation trades a small collision probability for key size;
//! the store rejects a detected collision rather than merging two URLs.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Number of leading fingerprint characters used as the storage partition key.
pub const PARTITION_PREFIX_LEN: usize = 5;

/// Computes the fingerprint of a URL: truncated hex SHA-256 of its bytes.
///
/// # Examples
///
/// ```
/// use sitemap_scout::identity::fingerprint;
///
/// let fp = fingerprint("https://example.com/product/1");
/// assert_eq!(fp.len(), 16);
/// assert_eq!(fp, fingerprint("https://example.com/product/1"));
/// ```
pub fn fingerprint(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}

/// Returns the partition key for a fingerprint: its leading hex characters.
pub fn partition_key(fingerprint: &str) -> &str {
    &fingerprint[..PARTITION_PREFIX_LEN.min(fingerprint.len())]
}
