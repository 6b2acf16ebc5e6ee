//! Sitemap-Scout main entry point
//!
//! This is the command-line interface for the Sitemap-Scout discovery and
//! dispatch pipeline.

use clap::Parser;
use sitemap_scout::config::load_config;
use sitemap_scout::dispatch::{DeltaDispatcher, SqliteQueue};
use sitemap_scout::pipeline::run_discovery;
use sitemap_scout::store::{SqliteStore, UrlStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sitemap-Scout: product URL discovery over XML sitemaps
///
/// Sitemap-Scout walks the sitemap trees of configured sites, persists
/// crawl-state metadata for every product URL it finds, and dispatches the
/// not-yet-crawled delta onto a work queue for a downstream fetch stage.
#[derive(Parser, Debug)]
#[command(name = "sitemap-scout")]
#[command(version = "0.3.0")]
#[command(about = "Product URL discovery over XML sitemaps", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the site catalog without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "dispatch", "dispatch_once"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "dispatch", "dispatch_once"])]
    stats: bool,

    /// Run delta-dispatch cycles at the configured interval
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "dispatch_once"])]
    dispatch: bool,

    /// Run a single delta-dispatch cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "dispatch"])]
    dispatch_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.dispatch || cli.dispatch_once {
        handle_dispatch(&config, cli.dispatch_once).await?;
    } else {
        handle_discover(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_scout=info,warn"),
            1 => EnvFilter::new("sitemap_scout=debug,info"),
            2 => EnvFilter::new("sitemap_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the site catalog
fn handle_dry_run(config: &sitemap_scout::Config) {
    println!("=== Sitemap-Scout Dry Run ===\n");

    println!("Discovery Configuration:");
    println!("  Max depth: {}", config.discovery.max_depth);
    println!(
        "  Max concurrent fetches: {}",
        config.discovery.max_concurrent_fetches
    );
    println!(
        "  Fetch timeout: {}s",
        config.discovery.fetch_timeout_secs
    );
    println!("  User agent: {}", config.discovery.user_agent);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\nDispatch:");
    println!("  Interval: {}s", config.dispatch.interval_secs);
    println!("  Queue: {}", config.dispatch.queue_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!(
            "  - {} ({}, {} entry points)",
            site.id,
            site.base_url,
            site.sitemap_urls.len()
        );
        for sitemap_url in &site.sitemap_urls {
            println!("    * {}", sitemap_url);
        }
        if let Some(filter) = &site.filter {
            println!("    filter: {}", filter);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows record counts from the database
fn handle_stats(config: &sitemap_scout::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path);

    let store = SqliteStore::new(Path::new(&config.store.database_path))?;
    println!("URL records:  {}", store.count_records()?);
    println!("Pending:      {}", store.count_pending()?);

    let queue = SqliteQueue::new(Path::new(&config.dispatch.queue_path))?;
    println!("Queued:       {}", queue.len()?);

    Ok(())
}

/// Handles the default mode: one discovery pass over every configured site
async fn handle_discover(config: &sitemap_scout::Config) -> anyhow::Result<()> {
    tracing::info!("Starting discovery over {} site(s)", config.sites.len());

    let mut store = SqliteStore::new(Path::new(&config.store.database_path))?;
    let report = run_discovery(config, &mut store).await?;

    println!(
        "Discovered {} URLs across {} site(s): {} new, {} refreshed",
        report.urls_discovered, report.sites, report.inserted, report.refreshed
    );
    if !report.sample.is_empty() {
        println!("Sample:");
        for url in &report.sample {
            println!("  {}", url);
        }
    }
    if report.has_failures() {
        // Partial success must not look like a clean run.
        println!(
            "Completed with failures: {} sitemaps failed, {} URLs rejected",
            report.nodes_failed, report.upsert_failures
        );
    }

    Ok(())
}

/// Handles the --dispatch and --dispatch-once modes
async fn handle_dispatch(config: &sitemap_scout::Config, once: bool) -> anyhow::Result<()> {
    let store = SqliteStore::new(Path::new(&config.store.database_path))?;
    let queue = SqliteQueue::new(Path::new(&config.dispatch.queue_path))?;
    let mut dispatcher = DeltaDispatcher::new(store, queue);

    if once {
        let report = dispatcher.run_cycle()?;
        println!(
            "Dispatch cycle: {} pending, {} published, {} failed",
            report.pending, report.published, report.failed
        );
        return Ok(());
    }

    tracing::info!(
        "Dispatching every {}s, Ctrl-C to stop",
        config.dispatch.interval_secs
    );
    dispatcher
        .run(Duration::from_secs(config.dispatch.interval_secs))
        .await?;

    Ok(())
}
