use crate::config::types::Config;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates a parsed configuration
///
/// Checks the numeric ranges of the runtime settings and the shape of every
/// site entry. An empty site catalog is fatal: there is nothing to discover
/// and the run would silently do no work.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.discovery.max_concurrent_fetches == 0 {
        return Err(ConfigError::Validation(
            "max-concurrent-fetches must be at least 1".to_string(),
        ));
    }

    if config.discovery.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.discovery.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent must not be empty".to_string(),
        ));
    }

    if config.dispatch.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "interval-secs must be at least 1".to_string(),
        ));
    }

    if config.store.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path must not be empty".to_string(),
        ));
    }

    if config.sites.is_empty() {
        return Err(ConfigError::Validation(
            "no sites configured: at least one [[site]] entry is required".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for site in &config.sites {
        if site.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site id must not be empty".to_string(),
            ));
        }

        if !seen_ids.insert(site.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site id: {}",
                site.id
            )));
        }

        let base = Url::parse(&site.base_url)
            .map_err(|_| ConfigError::InvalidUrl(site.base_url.clone()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(site.base_url.clone()));
        }

        if site.sitemap_urls.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site {} has no sitemap-urls",
                site.id
            )));
        }

        // Entry points may be relative; joining must succeed for each of them.
        for sitemap_url in &site.sitemap_urls {
            base.join(sitemap_url)
                .map_err(|_| ConfigError::InvalidUrl(sitemap_url.clone()))?;
        }
    }

    Ok(())
}
