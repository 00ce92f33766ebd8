//! Appointment entity - One scheduled grooming service for one pet.
//!
//! The console calls these records "pets": each row carries the pet and owner
//! details, the scheduled slot, the service-progress stepper state and, for
//! monthly plans, the remaining bath credit. Rows sharing a `phone` belong to
//! the same client.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The fixed set of grooming services an appointment can be booked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ServiceKind {
    /// Plain bath
    #[sea_orm(string_value = "bath")]
    Bath,
    /// Bath followed by a hygienic trim
    #[sea_orm(string_value = "bath_and_trim")]
    BathAndTrim,
    /// Trim of the hygienic areas only
    #[sea_orm(string_value = "hygienic_trim")]
    HygienicTrim,
    /// Full body trim
    #[sea_orm(string_value = "full_trim")]
    FullTrim,
    /// Prepaid bank of baths with an expiry
    #[sea_orm(string_value = "monthly_plan")]
    MonthlyPlan,
    /// Refill of an existing monthly plan
    #[sea_orm(string_value = "plan_renewal")]
    PlanRenewal,
}

impl ServiceKind {
    /// Human-readable name used on boards and receipts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bath => "Bath",
            Self::BathAndTrim => "Bath and Trim",
            Self::HygienicTrim => "Hygienic Trim",
            Self::FullTrim => "Full Trim",
            Self::MonthlyPlan => "Monthly Plan",
            Self::PlanRenewal => "Plan Renewal",
        }
    }

    /// Whether the service includes a trimming stage.
    #[must_use]
    pub const fn includes_trim(self) -> bool {
        matches!(self, Self::BathAndTrim | Self::HygienicTrim | Self::FullTrim)
    }

    /// Whether selling this service (re)fills a monthly plan.
    #[must_use]
    pub const fn is_plan(self) -> bool {
        matches!(self, Self::MonthlyPlan | Self::PlanRenewal)
    }

    /// Whether a monthly-plan credit can pay for this service.
    #[must_use]
    pub const fn is_plan_coverable(self) -> bool {
        matches!(self, Self::Bath | Self::BathAndTrim)
    }
}

/// Appointment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    /// Unique identifier for the appointment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the pet being groomed
    pub pet_name: String,
    /// Owner's display name
    pub owner: String,
    /// Contact phone; the client identity key
    pub phone: String,
    /// Pet breed
    pub breed: String,
    /// Free-text notes for the groomer
    pub observations: String,
    /// Booked service
    pub service_kind: ServiceKind,
    /// Scheduled start (wall clock)
    pub schedule_date: DateTime,
    /// Scheduled end, when a duration was given at booking
    pub schedule_end_date: Option<DateTime>,
    /// Remaining plan baths, only set for monthly plans
    pub monthly_baths_remaining: Option<i32>,
    /// Plan expiry; `None` means no expiry was recorded
    pub plan_expires_at: Option<DateTime>,
    /// Whether the pet is currently on the grooming table
    pub in_service: bool,
    /// Index into the service's stage list
    pub service_progress: i32,
    /// Whether the service was finished
    pub completed_today: bool,
    /// When the service was started
    pub service_started_at: Option<DateTime>,
    /// When the service was finished
    pub service_ended_at: Option<DateTime>,
    /// When the record was created
    pub created_at: DateTime,
}

/// Appointments have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
