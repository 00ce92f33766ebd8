/// Database configuration and connection management
pub mod database;

/// Plan policy and price list loading from config.toml
pub mod catalog;

/// Bootstrap owner account from environment variables
pub mod accounts;

pub use catalog::{CatalogItemConfig, Config, PlanPolicy, load_config, load_default_config};
