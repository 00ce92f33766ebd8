//! Catalog item entity - The shop's price list.
//!
//! Grooming services carry the `ServiceKind` they book; add-ons (nail
//! clipping, hydration) and retail products leave it empty.

use super::appointment::ServiceKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown at the cashier (e.g., "Bath", "Pet Perfume")
    #[sea_orm(unique)]
    pub name: String,
    /// Short description printed under the name
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Grooming service this item books, if any
    pub service_kind: Option<ServiceKind>,
    /// Retail product rather than a service
    pub is_product: bool,
    /// Soft delete flag - if true, item is hidden but data is preserved
    pub is_deleted: bool,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// `CatalogItem` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
