//! Breadth-first traversal of a site's sitemap tree
//!
//! The walker owns cycle safety, subtree filtering, and deduplication. It never
//! persists anything: discovered URLs are handed back to the caller so storage
//! can be substituted in tests and retried independently.

use crate::sitemap::resolver::{build_header_map, SitemapResolver};
use crate::sitemap::{DiscoveredUrl, DomainDescriptor, SitemapKind};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Result of walking one site's sitemap tree
#[derive(Debug)]
pub struct WalkOutcome {
    /// Deduplicated product URL candidates in first-seen order
    pub urls: Vec<DiscoveredUrl>,

    /// Sitemap documents fetched and parsed successfully
    pub nodes_fetched: usize,

    /// Sitemap documents that failed to fetch or parse (subtree skipped)
    pub nodes_failed: usize,
}

/// Walks sitemap trees breadth-first, one site per call
pub struct SitemapWalker {
    resolver: SitemapResolver,
    max_concurrent: usize,
    max_depth: u32,
}

impl SitemapWalker {
    pub fn new(resolver: SitemapResolver, max_concurrent: usize, max_depth: u32) -> Self {
        Self {
            resolver,
            max_concurrent: max_concurrent.max(1),
            max_depth,
        }
    }

    /// Discovers product URL candidates for one site
    ///
    /// Traversal starts from the descriptor's entry points at depth 0. Index
    /// children are enqueued at depth+1 after the descriptor's substring filter
    /// is applied to their locations; urlset locations are emitted at the
    /// node's depth. Siblings within one level are fetched concurrently,
    /// bounded by the walker's fetch limit; a child is only ever fetched after
    /// its parent index resolved.
    ///
    /// A fetch or parse failure on any node is logged and skips that subtree
    /// only; partial results are still returned. A visited set guards against
    /// self-referential sitemap graphs. The walk itself never fails; the
    /// outcome carries the failure count for the caller's error summary.
    pub async fn discover(&self, descriptor: &DomainDescriptor) -> WalkOutcome {
        let headers = build_header_map(&descriptor.headers);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<(String, u32)> = Vec::new();
        for entry in &descriptor.sitemap_urls {
            let url = entry.to_string();
            if visited.insert(url.clone()) {
                frontier.push((url, 0));
            }
        }

        let mut emitted: Vec<DiscoveredUrl> = Vec::new();
        let mut nodes_fetched = 0;
        let mut nodes_failed = 0;

        while !frontier.is_empty() {
            let level = std::mem::take(&mut frontier);
            let mut handles = Vec::with_capacity(level.len());

            for (url, depth) in level {
                let resolver = self.resolver.clone();
                let headers = headers.clone();
                let semaphore = Arc::clone(&semaphore);
                handles.push(tokio::spawn(async move {
                    // Closed only on runtime shutdown.
                    let _permit = semaphore.acquire_owned().await;
                    let result = resolver.fetch(&url, &headers).await;
                    (url, depth, result)
                }));
            }

            for handle in handles {
                let (url, depth, result) = match handle.await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Sitemap fetch task panicked: {}", e);
                        nodes_failed += 1;
                        continue;
                    }
                };

                let node = match result {
                    Ok(node) => node,
                    Err(e) => {
                        tracing::warn!("[{}] Skipping sitemap {}: {}", descriptor.id, url, e);
                        nodes_failed += 1;
                        continue;
                    }
                };

                nodes_fetched += 1;
                match node.kind {
                    SitemapKind::Index => {
                        if depth >= self.max_depth {
                            tracing::warn!(
                                "[{}] Sitemap index depth limit ({}) reached at {}, not descending",
                                descriptor.id,
                                self.max_depth,
                                url
                            );
                            continue;
                        }
                        for loc in node.locations {
                            if let Some(filter) = &descriptor.filter {
                                if !loc.contains(filter.as_str()) {
                                    continue;
                                }
                            }
                            if visited.insert(loc.clone()) {
                                frontier.push((loc, depth + 1));
                            }
                        }
                    }
                    SitemapKind::Urlset => {
                        tracing::debug!(
                            "[{}] {} page URLs from {}",
                            descriptor.id,
                            node.locations.len(),
                            url
                        );
                        for loc in node.locations {
                            emitted.push(DiscoveredUrl { url: loc, depth });
                        }
                    }
                }
            }
        }

        // Dedupe by exact URL string, keeping the first occurrence.
        let mut seen: HashSet<String> = HashSet::with_capacity(emitted.len());
        let urls: Vec<DiscoveredUrl> = emitted
            .into_iter()
            .filter(|d| seen.insert(d.url.clone()))
            .collect();

        tracing::info!(
            "[{}] Discovery walk complete: {} URLs, {} sitemaps fetched, {} failed",
            descriptor.id,
            urls.len(),
            nodes_fetched,
            nodes_failed
        );

        WalkOutcome {
            urls,
            nodes_fetched,
            nodes_failed,
        }
    }
}
