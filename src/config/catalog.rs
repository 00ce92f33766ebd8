//! Plan policy and price list loading from config.toml
//!
//! The price list defined in config.toml seeds the catalog table at start-up;
//! the `[plan]` table sets how many baths a monthly plan grants and how long
//! it stays valid.

use crate::entities::ServiceKind;
use crate::errors::{Error, Result};
use chrono::{NaiveDateTime, TimeDelta};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Monthly plan settings
    #[serde(default)]
    pub plan: PlanPolicy,
    /// Price list to seed
    #[serde(default)]
    pub catalog: Vec<CatalogItemConfig>,
}

/// How monthly plans are granted and refilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlanPolicy {
    /// Baths credited when a plan appointment is created
    pub default_baths: i32,
    /// Baths credited when a plan is sold or renewed at checkout
    pub renewal_baths: i32,
    /// Days a plan stays valid; 0 records no expiry
    pub validity_days: i64,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            default_baths: 4,
            renewal_baths: 4,
            validity_days: 30,
        }
    }
}

impl PlanPolicy {
    /// Expiry of a plan granted at `from`, or `None` when plans never expire.
    #[must_use]
    pub fn expiry_from(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        (self.validity_days > 0).then(|| from + TimeDelta::days(self.validity_days))
    }
}

/// Configuration for a single catalog entry
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogItemConfig {
    /// Name shown at the cashier
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Grooming service this entry books, if any
    #[serde(default)]
    pub service_kind: Option<ServiceKind>,
    /// Retail product rather than a service
    #[serde(default)]
    pub is_product: bool,
}

/// Loads the console configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.plan.default_baths < 0 || config.plan.renewal_baths <= 0 {
        return Err(Error::Config {
            message: "Plan bath counts must be positive".to_string(),
        });
    }
    if config.plan.validity_days < 0 {
        return Err(Error::Config {
            message: "Plan validity cannot be negative".to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from the location named by `GROOMDESK_CONFIG`,
/// defaulting to ./config.toml
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("GROOMDESK_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
