//! User entity - Staff accounts that can sign in to the console.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level of a staff account.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserRole {
    /// Full access, including staff administration
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Day-to-day access without administration
    #[sea_orm(string_value = "employee")]
    Employee,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Access level
    pub role: UserRole,
    /// Marks the owner account created at first start
    pub is_bootstrap: bool,
    /// When the account was created
    pub created_at: DateTime,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
