//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables the console keeps its records in.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod appointment;
pub mod catalog_item;
pub mod handoff;
pub mod user;

// Re-export specific types to avoid conflicts
pub use appointment::{
    Column as AppointmentColumn, Entity as Appointment, Model as AppointmentModel, ServiceKind,
};
pub use catalog_item::{
    Column as CatalogItemColumn, Entity as CatalogItem, Model as CatalogItemModel,
};
pub use handoff::{Column as HandoffColumn, Entity as Handoff, Model as HandoffModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
