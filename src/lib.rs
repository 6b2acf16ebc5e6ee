//! Sitemap-Scout: product URL discovery over XML sitemaps
//!
//! This crate walks the sitemap trees of configured e-commerce sites, assigns each
//! discovered product URL a stable fingerprint, persists crawl-state metadata, and
//! periodically dispatches the not-yet-crawled delta onto a work queue for a
//! downstream fetch stage.

pub mod config;
pub mod dispatch;
pub mod identity;
pub mod pipeline;
pub mod sitemap;
pub mod store;

use thiserror::Error;

/// Main error type for Sitemap-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Sitemap parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] dispatch::QueueError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sitemap-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use identity::{fingerprint, partition_key};
pub use sitemap::{DiscoveredUrl, DomainDescriptor, SitemapKind, SitemapNode};
pub use store::{UrlRecord, UrlStore};
