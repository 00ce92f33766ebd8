//! Catalog business logic - the editable price list.
//!
//! Items are seeded from config.toml and can then be added, edited and removed
//! from the cashier screen. Removal is a soft delete so past carts keep their
//! names.

use crate::{
    config::CatalogItemConfig,
    entities::{CatalogItem, ServiceKind, catalog_item},
    errors::{Error, Result},
};
use chrono::Local;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Editable fields of a catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogItemFields {
    /// Name shown at the cashier
    pub name: String,
    /// Short description
    pub description: String,
    /// Unit price
    pub price: f64,
}

fn validate(name: &str, price: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Catalog item name cannot be empty".to_string(),
        });
    }
    if price < 0.0 || !price.is_finite() {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(())
}

/// Retrieves all active items, ordered alphabetically by name.
pub async fn get_all_active_items(db: &DatabaseConnection) -> Result<Vec<catalog_item::Model>> {
    CatalogItem::find()
        .filter(catalog_item::Column::IsDeleted.eq(false))
        .order_by_asc(catalog_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active item by name.
pub async fn get_item_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<catalog_item::Model>> {
    CatalogItem::find()
        .filter(catalog_item::Column::Name.eq(name))
        .filter(catalog_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the active item that books `kind`, if the price list has one.
pub async fn get_item_for_service(
    db: &DatabaseConnection,
    kind: ServiceKind,
) -> Result<Option<catalog_item::Model>> {
    CatalogItem::find()
        .filter(catalog_item::Column::ServiceKind.eq(kind))
        .filter(catalog_item::Column::IsDeleted.eq(false))
        .order_by_asc(catalog_item::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn insert_item(
    db: &DatabaseConnection,
    fields: CatalogItemFields,
    service_kind: Option<ServiceKind>,
    is_product: bool,
) -> Result<catalog_item::Model> {
    validate(&fields.name, fields.price)?;

    let item = catalog_item::ActiveModel {
        name: Set(fields.name.trim().to_string()),
        description: Set(fields.description),
        price: Set(fields.price),
        service_kind: Set(service_kind),
        is_product: Set(is_product),
        is_deleted: Set(false),
        updated_at: Set(Local::now().naive_local()),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Adds an add-on or product to the price list.
///
/// # Errors
/// Returns an error if the name is blank, the price is negative or not finite,
/// or the name is already taken.
pub async fn create_item(
    db: &DatabaseConnection,
    fields: CatalogItemFields,
    is_product: bool,
) -> Result<catalog_item::Model> {
    insert_item(db, fields, None, is_product).await
}

/// Inserts every configured item whose name is not in the table yet.
/// Returns how many were added.
pub async fn seed_catalog(db: &DatabaseConnection, items: &[CatalogItemConfig]) -> Result<usize> {
    let mut added = 0;
    for cfg in items {
        let exists = CatalogItem::find()
            .filter(catalog_item::Column::Name.eq(cfg.name.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Catalog item '{}' already present", cfg.name);
            continue;
        }
        let fields = CatalogItemFields {
            name: cfg.name.clone(),
            description: cfg.description.clone(),
            price: cfg.price,
        };
        insert_item(db, fields, cfg.service_kind, cfg.is_product).await?;
        added += 1;
    }
    info!("Seeded {} catalog item(s)", added);
    Ok(added)
}

/// Renames and reprices an active item.
pub async fn update_item(
    db: &DatabaseConnection,
    current_name: &str,
    fields: CatalogItemFields,
) -> Result<catalog_item::Model> {
    validate(&fields.name, fields.price)?;
    let item = get_item_by_name(db, current_name)
        .await?
        .ok_or_else(|| Error::CatalogItemNotFound {
            name: current_name.to_string(),
        })?;

    let mut active: catalog_item::ActiveModel = item.into();
    active.name = Set(fields.name.trim().to_string());
    active.description = Set(fields.description);
    active.price = Set(fields.price);
    active.updated_at = Set(Local::now().naive_local());
    active.update(db).await.map_err(Into::into)
}

/// Hides an item from the price list.
pub async fn delete_item(db: &DatabaseConnection, name: &str) -> Result<()> {
    let item = get_item_by_name(db, name)
        .await?
        .ok_or_else(|| Error::CatalogItemNotFound {
            name: name.to_string(),
        })?;

    let mut active: catalog_item::ActiveModel = item.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Local::now().naive_local());
    active.update(db).await?;
    info!("Removed '{}' from the catalog", name);
    Ok(())
}
