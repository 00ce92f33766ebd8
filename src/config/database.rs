//! Database configuration module for groomdesk.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! The default URL is an in-memory database: every record lives for the lifetime
//! of the process only. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Appointment, CatalogItem, Handoff, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Gets the database URL from environment variable or returns the in-memory default.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database named by `DATABASE_URL`,
/// falling back to an in-memory database.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let appointment_table = schema.create_table_from_entity(Appointment);
    let user_table = schema.create_table_from_entity(User);
    let catalog_table = schema.create_table_from_entity(CatalogItem);
    let handoff_table = schema.create_table_from_entity(Handoff);

    db.execute(builder.build(&appointment_table)).await?;
    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&catalog_table)).await?;
    db.execute(builder.build(&handoff_table)).await?;

    info!("Database tables created");
    Ok(())
}
