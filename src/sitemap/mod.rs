//! Sitemap discovery: fetching, classifying, and walking sitemap trees
//!
//! A sitemap document is either an index (its `<loc>` entries point at other
//! sitemaps) or a urlset (its entries are page URLs). The resolver handles one
//! document; the walker drives the resolver breadth-first over a whole site.

mod resolver;
mod walker;

pub use resolver::SitemapResolver;
pub use walker::{SitemapWalker, WalkOutcome};

use crate::config::SiteEntry;
use crate::ConfigError;
use std::collections::HashMap;
use url::Url;

/// Kind of a fetched sitemap document, determined by its root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// Entries are locations of other sitemap documents
    Index,
    /// Entries are page URLs
    Urlset,
}

/// One fetched sitemap document; discarded after its locations are extracted
#[derive(Debug)]
pub struct SitemapNode {
    /// URL this document was fetched from
    pub source_url: String,

    /// Index or urlset
    pub kind: SitemapKind,

    /// All `<loc>` text values in document order, whitespace-trimmed.
    /// Empty is valid: a sitemap with no entries is not an error.
    pub locations: Vec<String>,
}

/// A product URL candidate emitted by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrl {
    pub url: String,

    /// Distance from the site's root sitemap (entry points are depth 0)
    pub depth: u32,
}

/// Per-site discovery input: entry points, filter, and request headers.
///
/// Built from a config [`SiteEntry`]; read-only to the discovery core.
#[derive(Debug, Clone)]
pub struct DomainDescriptor {
    pub id: String,
    pub base_url: Url,
    pub sitemap_urls: Vec<Url>,
    pub filter: Option<String>,
    pub headers: HashMap<String, String>,
}

impl DomainDescriptor {
    /// Builds a descriptor from a site entry, joining relative sitemap entry
    /// points against the site's base URL.
    pub fn from_site(entry: &SiteEntry) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&entry.base_url)
            .map_err(|_| ConfigError::InvalidUrl(entry.base_url.clone()))?;

        let mut sitemap_urls = Vec::with_capacity(entry.sitemap_urls.len());
        for sitemap_url in &entry.sitemap_urls {
            let joined = base_url
                .join(sitemap_url)
                .map_err(|_| ConfigError::InvalidUrl(sitemap_url.clone()))?;
            sitemap_urls.push(joined);
        }

        Ok(Self {
            id: entry.id.clone(),
            base_url,
            sitemap_urls,
            filter: entry.filter.clone(),
            headers: entry.headers.clone(),
        })
    }
}
