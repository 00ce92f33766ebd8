//! Bootstrap owner configuration from environment variables.
//!
//! The first owner account is created from `BOOTSTRAP_OWNER_EMAIL`,
//! `BOOTSTRAP_OWNER_NAME` and `BOOTSTRAP_OWNER_PASSWORD`. Only the password
//! has no default.

use crate::errors::Result;

/// Credentials of the owner account seeded at start-up.
#[derive(Debug, Clone)]
pub struct BootstrapOwner {
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Plain password, hashed before storage
    pub password: String,
}

/// Reads the bootstrap owner from the environment.
///
/// # Errors
/// Returns `Error::EnvVar` if `BOOTSTRAP_OWNER_PASSWORD` is not set.
pub fn bootstrap_owner_from_env() -> Result<BootstrapOwner> {
    let email =
        std::env::var("BOOTSTRAP_OWNER_EMAIL").unwrap_or_else(|_| "owner@example.com".to_string());
    let name = std::env::var("BOOTSTRAP_OWNER_NAME").unwrap_or_else(|_| "Owner".to_string());
    let password = std::env::var("BOOTSTRAP_OWNER_PASSWORD")?;

    Ok(BootstrapOwner {
        email,
        name,
        password,
    })
}
