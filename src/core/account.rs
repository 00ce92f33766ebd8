//! Staff account business logic - the roster behind the login screen.
//!
//! Raw create/update/delete operations on the users table plus the
//! owner-gated wrappers the settings screen goes through. Passwords are stored
//! as argon2 hashes.

use crate::{
    config::accounts::BootstrapOwner,
    core::session::Session,
    entities::{User, UserRole, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Local;
use rand_core::OsRng;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument, warn};

/// Fields of the "new user" dialog.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email
    pub email: String,
    /// Plain password
    pub password: String,
    /// Display name
    pub name: String,
    /// Access level
    pub role: UserRole,
}

/// Fields of the "edit user" dialog; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New login email
    pub email: Option<String>,
    /// New password; empty keeps the current one
    pub password: Option<String>,
    /// New display name
    pub name: Option<String>,
    /// New access level
    pub role: Option<UserRole>,
}

pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}

/// Lists every account, oldest first.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an account by id.
pub async fn get_user_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds an account by its exact login email.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn ensure_email_free(db: &DatabaseConnection, email: &str, except: Option<i64>) -> Result<()> {
    match get_user_by_email(db, email.trim()).await? {
        Some(existing) if Some(existing.id) != except => Err(Error::DuplicateEmail {
            email: email.trim().to_string(),
        }),
        _ => Ok(()),
    }
}

async fn insert_user(db: &DatabaseConnection, fields: NewUser, is_bootstrap: bool) -> Result<user::Model> {
    require_text("Email", &fields.email)?;
    require_text("Name", &fields.name)?;
    require_text("Password", &fields.password)?;
    ensure_email_free(db, &fields.email, None).await?;

    let account = user::ActiveModel {
        email: Set(fields.email.trim().to_string()),
        password_hash: Set(hash_password(&fields.password)?),
        name: Set(fields.name.trim().to_string()),
        role: Set(fields.role),
        is_bootstrap: Set(is_bootstrap),
        created_at: Set(Local::now().naive_local()),
        ..Default::default()
    };
    let created = account.insert(db).await?;
    info!("Created {:?} account {} ({})", created.role, created.email, created.id);
    Ok(created)
}

/// Adds an account to the roster.
///
/// # Errors
/// Returns an error if:
/// - The email, name or password is blank
/// - Another account already uses the email
pub async fn create_user(db: &DatabaseConnection, fields: NewUser) -> Result<user::Model> {
    insert_user(db, fields, false).await
}

/// Merges `changes` into an account. An absent or empty password keeps the
/// stored hash.
#[instrument(skip(db, changes))]
pub async fn update_user(
    db: &DatabaseConnection,
    id: i64,
    changes: UserUpdate,
) -> Result<user::Model> {
    let existing = get_user_by_id(db, id)
        .await?
        .ok_or(Error::UserNotFound { id })?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = changes.email {
        require_text("Email", &email)?;
        ensure_email_free(db, &email, Some(id)).await?;
        active.email = Set(email.trim().to_string());
    }
    if let Some(name) = changes.name {
        require_text("Name", &name)?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(role) = changes.role {
        active.role = Set(role);
    }
    match changes.password {
        Some(password) if !password.is_empty() => {
            active.password_hash = Set(hash_password(&password)?);
        }
        _ => {}
    }

    active.update(db).await.map_err(Into::into)
}

/// Removes an account. This raw operation does not protect the bootstrap
/// owner; the settings screen goes through [`admin_delete_user`].
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = User::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::UserNotFound { id });
    }
    info!("Deleted account {}", id);
    Ok(())
}

/// Creates the bootstrap owner unless an account with its email exists.
pub async fn seed_bootstrap_owner(
    db: &DatabaseConnection,
    owner: &BootstrapOwner,
) -> Result<user::Model> {
    if let Some(existing) = get_user_by_email(db, owner.email.trim()).await? {
        if existing.role != UserRole::Owner {
            warn!("Bootstrap email {} belongs to a non-owner account", owner.email);
        }
        return Ok(existing);
    }

    insert_user(
        db,
        NewUser {
            email: owner.email.clone(),
            password: owner.password.clone(),
            name: owner.name.clone(),
            role: UserRole::Owner,
        },
        true,
    )
    .await
}

/// [`create_user`] behind the owner gate.
pub async fn admin_create_user(
    session: &Session,
    db: &DatabaseConnection,
    fields: NewUser,
) -> Result<user::Model> {
    session.require_owner()?;
    create_user(db, fields).await
}

/// [`update_user`] behind the owner gate; the bootstrap owner keeps its role.
pub async fn admin_update_user(
    session: &Session,
    db: &DatabaseConnection,
    id: i64,
    changes: UserUpdate,
) -> Result<user::Model> {
    session.require_owner()?;
    let target = get_user_by_id(db, id)
        .await?
        .ok_or(Error::UserNotFound { id })?;
    if target.is_bootstrap && changes.role.is_some_and(|role| role != UserRole::Owner) {
        warn!("Refused to demote bootstrap owner {}", id);
        return Err(Error::ProtectedAccount { id });
    }
    update_user(db, id, changes).await
}

/// [`delete_user`] behind the owner gate; the bootstrap owner cannot be removed.
pub async fn admin_delete_user(session: &Session, db: &DatabaseConnection, id: i64) -> Result<()> {
    session.require_owner()?;
    let target = get_user_by_id(db, id)
        .await?
        .ok_or(Error::UserNotFound { id })?;
    if target.is_bootstrap {
        warn!("Refused to delete bootstrap owner {}", id);
        return Err(Error::ProtectedAccount { id });
    }
    delete_user(db, id).await
}
