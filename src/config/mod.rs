//! Configuration handling for Sitemap-Scout
//!
//! Loads the TOML site catalog and runtime settings, and validates them before
//! any network or database work starts.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, DiscoveryConfig, DispatchConfig, SiteEntry, StoreConfig};
pub use validation::validate;
