//! Signed-in user state.
//!
//! A [`Session`] belongs to one console window. It holds at most one account;
//! views gated to owners check it through [`Session::require_owner`].

use crate::{
    core::account,
    entities::{UserRole, user},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

/// The account currently signed in, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<user::Model>,
}

impl Session {
    /// A signed-out session.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Signs in with an exact email and password match.
    ///
    /// Returns `Ok(false)` and leaves the session signed out when nothing
    /// matches; a previously signed-in account is signed out as well.
    pub async fn login(
        &mut self,
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<bool> {
        let found = account::get_user_by_email(db, email)
            .await?
            .filter(|candidate| account::verify_password(password, &candidate.password_hash));

        match found {
            Some(user) => {
                info!("{} signed in as {:?}", user.email, user.role);
                self.current = Some(user);
                Ok(true)
            }
            None => {
                debug!("Sign-in rejected for {}", email);
                self.current = None;
                Ok(false)
            }
        }
    }

    /// Signs out unconditionally.
    pub fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            info!("{} signed out", user.email);
        }
    }

    /// The signed-in account.
    #[must_use]
    pub const fn current_user(&self) -> Option<&user::Model> {
        self.current.as_ref()
    }

    /// Whether the signed-in account has owner access.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|user| user.role == UserRole::Owner)
    }

    /// Fails with `Error::AccessDenied` unless an owner is signed in.
    pub fn require_owner(&self) -> Result<&user::Model> {
        match self.current.as_ref() {
            Some(user) if user.role == UserRole::Owner => Ok(user),
            _ => Err(Error::AccessDenied),
        }
    }
}
