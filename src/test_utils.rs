//! Shared test utilities for groomdesk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    config::{CatalogItemConfig, PlanPolicy},
    core::{
        account::{self, NewUser},
        appointment::{self, NewAppointment},
        catalog,
    },
    entities::{ServiceKind, UserRole, appointment as appointment_entity, catalog_item, user},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a wall-clock instant, panicking on invalid input.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Booking fields with sensible defaults.
///
/// # Defaults
/// * `owner`: "Ana Lima"
/// * `breed`: "Poodle"
/// * `schedule_date`: 2024-03-01 10:00
/// * no duration, no observations, default plan credit
#[must_use]
pub fn new_appointment(pet_name: &str, phone: &str, kind: ServiceKind) -> NewAppointment {
    NewAppointment {
        pet_name: pet_name.to_string(),
        owner: "Ana Lima".to_string(),
        phone: phone.to_string(),
        breed: "Poodle".to_string(),
        observations: String::new(),
        service_kind: kind,
        schedule_date: at(2024, 3, 1, 10, 0),
        duration_minutes: None,
        monthly_baths: None,
    }
}

/// Creates a test appointment with the default plan policy.
pub async fn create_test_appointment(
    db: &DatabaseConnection,
    pet_name: &str,
    phone: &str,
    kind: ServiceKind,
) -> Result<appointment_entity::Model> {
    appointment::create_appointment(
        db,
        new_appointment(pet_name, phone, kind),
        &PlanPolicy::default(),
    )
    .await
}

/// Creates a monthly-plan appointment holding `baths` credits and no expiry.
pub async fn create_plan_appointment(
    db: &DatabaseConnection,
    pet_name: &str,
    phone: &str,
    baths: i32,
) -> Result<appointment_entity::Model> {
    let mut fields = new_appointment(pet_name, phone, ServiceKind::MonthlyPlan);
    fields.monthly_baths = Some(baths);
    let policy = PlanPolicy {
        validity_days: 0,
        ..PlanPolicy::default()
    };
    appointment::create_appointment(db, fields, &policy).await
}

/// Creates a staff account.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: UserRole,
) -> Result<user::Model> {
    account::create_user(
        db,
        NewUser {
            email: email.to_string(),
            password: password.to_string(),
            name: "Test User".to_string(),
            role,
        },
    )
    .await
}

/// A small price list covering services, add-ons, plans and products.
#[must_use]
pub fn test_catalog() -> Vec<CatalogItemConfig> {
    let item = |name: &str, price: f64, service_kind: Option<ServiceKind>, is_product: bool| {
        CatalogItemConfig {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            service_kind,
            is_product,
        }
    };
    vec![
        item("Bath", 60.0, Some(ServiceKind::Bath), false),
        item("Bath and Trim", 80.0, Some(ServiceKind::BathAndTrim), false),
        item("Full Trim", 90.0, Some(ServiceKind::FullTrim), false),
        item("Monthly Plan", 180.0, Some(ServiceKind::MonthlyPlan), false),
        item("Plan Renewal", 180.0, Some(ServiceKind::PlanRenewal), false),
        item("Nail Clipping", 25.0, None, false),
        item("Pet Perfume", 35.0, None, true),
    ]
}

/// Seeds [`test_catalog`] and returns the stored items.
pub async fn seed_test_catalog(db: &DatabaseConnection) -> Result<Vec<catalog_item::Model>> {
    catalog::seed_catalog(db, &test_catalog()).await?;
    catalog::get_all_active_items(db).await
}

/// An unsaved appointment record for pure-function tests.
#[must_use]
pub fn sample_appointment(kind: ServiceKind) -> appointment_entity::Model {
    let scheduled = at(2024, 3, 1, 10, 0);
    appointment_entity::Model {
        id: 1,
        pet_name: "Rex".to_string(),
        owner: "Ana Lima".to_string(),
        phone: "+5511999999999".to_string(),
        breed: "Golden Retriever".to_string(),
        observations: String::new(),
        service_kind: kind,
        schedule_date: scheduled,
        schedule_end_date: None,
        monthly_baths_remaining: (kind == ServiceKind::MonthlyPlan).then_some(4),
        plan_expires_at: None,
        in_service: false,
        service_progress: 0,
        completed_today: false,
        service_started_at: None,
        service_ended_at: None,
        created_at: scheduled,
    }
}
