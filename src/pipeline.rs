//! Discovery pipeline: config in, persisted URL metadata out
//!
//! Runs the sitemap walk for every configured site and lands the results in
//! the store. Sites are independent; one site failing its walk entirely does
//! not stop the others.

use crate::config::Config;
use crate::sitemap::{DomainDescriptor, SitemapResolver, SitemapWalker};
use crate::store::UrlStore;
use chrono::Utc;
use std::time::Duration;

/// Totals from one discovery pass over every configured site
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Sites walked
    pub sites: usize,

    /// Unique URLs the walkers emitted across all sites
    pub urls_discovered: usize,

    /// New store records
    pub inserted: usize,

    /// Existing records refreshed
    pub refreshed: usize,

    /// URLs the store rejected
    pub upsert_failures: usize,

    /// Sitemap documents that failed to fetch or parse
    pub nodes_failed: usize,

    /// Up to the first ten discovered URLs, for operator output
    pub sample: Vec<String>,
}

impl DiscoveryReport {
    /// Whether anything along the pass went wrong
    pub fn has_failures(&self) -> bool {
        self.upsert_failures > 0 || self.nodes_failed > 0
    }
}

const SAMPLE_LIMIT: usize = 10;

/// Walks every configured site and persists the discovered URLs
///
/// Each site gets its own descriptor built from config; a site whose
/// descriptor cannot be built (bad URL slipped past validation) is logged and
/// skipped. Upserts happen per site, timestamped at the moment that site's
/// walk finished, so a long pass does not hold one batch timestamp across
/// sites.
pub async fn run_discovery<S: UrlStore>(
    config: &Config,
    store: &mut S,
) -> crate::Result<DiscoveryReport> {
    let resolver = SitemapResolver::new(
        &config.discovery.user_agent,
        Duration::from_secs(config.discovery.fetch_timeout_secs),
    )?;
    let walker = SitemapWalker::new(
        resolver,
        config.discovery.max_concurrent_fetches as usize,
        config.discovery.max_depth,
    );

    let mut report = DiscoveryReport::default();

    for site in &config.sites {
        let descriptor = match DomainDescriptor::from_site(site) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("[{}] Skipping site, bad descriptor: {}", site.id, e);
                continue;
            }
        };

        tracing::info!(
            "[{}] Starting discovery from {} entry point(s)",
            descriptor.id,
            descriptor.sitemap_urls.len()
        );
        let outcome = walker.discover(&descriptor).await;

        let upsert = store.upsert_discovered(&outcome.urls, Utc::now())?;
        tracing::info!(
            "[{}] Stored: {} inserted, {} refreshed, {} rejected",
            descriptor.id,
            upsert.inserted,
            upsert.refreshed,
            upsert.failed
        );

        report.sites += 1;
        report.urls_discovered += outcome.urls.len();
        report.inserted += upsert.inserted;
        report.refreshed += upsert.refreshed;
        report.upsert_failures += upsert.failed;
        report.nodes_failed += outcome.nodes_failed;
        for discovered in outcome
            .urls
            .iter()
            .take(SAMPLE_LIMIT.saturating_sub(report.sample.len()))
        {
            report.sample.push(discovered.url.clone());
        }
    }

    Ok(report)
}
