use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for Sitemap-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

/// Sitemap discovery behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum sitemap-index depth to follow from a site's entry points
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of concurrent sitemap fetches within one site walk
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// User agent sent when a site supplies no User-Agent header of its own
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// URL metadata store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file holding url_records
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Delta-dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Seconds between delta-dispatch cycles
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,

    /// Path to the SQLite database file backing the work queue
    #[serde(rename = "queue-path")]
    pub queue_path: String,
}

/// One site in the catalog: where its sitemaps live and how to ask for them
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Stable identifier used in logs and reports
    pub id: String,

    /// Base URL of the site; relative sitemap entry points are joined against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sitemap entry points, absolute or relative to the base URL
    #[serde(rename = "sitemap-urls")]
    pub sitemap_urls: Vec<String>,

    /// Substring that child sitemap locations must contain to be walked
    /// (e.g. "product" keeps `a-product.xml` and drops `a-page.xml`)
    #[serde(default)]
    pub filter: Option<String>,

    /// Extra request headers for sites that refuse default clients
    #[serde(default)]
    pub headers: HashMap<String, String>,
}
