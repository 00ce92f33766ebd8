//! Appointment business logic - The only valid ways to change an appointment.
//!
//! Provides booking, quick scheduling, calendar moves, the service-progress
//! transitions and monthly-plan credit adjustments. Lookups against an unknown
//! id or phone are reported as errors rather than ignored. All functions are
//! async and return Result types for error handling.

use crate::{
    config::PlanPolicy,
    core::workflow::{self, WorkflowState},
    entities::{Appointment, ServiceKind, appointment},
    errors::{Error, Result},
};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    /// Name of the pet
    pub pet_name: String,
    /// Owner's display name
    pub owner: String,
    /// Contact phone
    pub phone: String,
    /// Pet breed
    pub breed: String,
    /// Notes for the groomer
    pub observations: String,
    /// Booked service
    pub service_kind: ServiceKind,
    /// Scheduled start
    pub schedule_date: NaiveDateTime,
    /// Expected length; sets the scheduled end when present
    pub duration_minutes: Option<i64>,
    /// Plan credit override; the policy default applies when `None`
    pub monthly_baths: Option<i32>,
}

/// Fields of the quick-schedule form, applied to every pet of a client.
#[derive(Debug, Clone)]
pub struct QuickSchedule {
    /// Booked service
    pub service_kind: ServiceKind,
    /// Scheduled start
    pub schedule_date: NaiveDateTime,
    /// Notes for the groomer
    pub observations: String,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}

fn invalid_transition(record: &appointment::Model, action: &'static str) -> Error {
    Error::InvalidTransition {
        id: record.id,
        action,
        state: WorkflowState::of(record).to_string(),
    }
}

/// Retrieves every appointment in creation order.
pub async fn get_all_appointments<C>(db: &C) -> Result<Vec<appointment::Model>>
where
    C: ConnectionTrait,
{
    Appointment::find()
        .order_by_asc(appointment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an appointment by its id, returning None if it does not exist.
pub async fn get_appointment_by_id<C>(db: &C, id: i64) -> Result<Option<appointment::Model>>
where
    C: ConnectionTrait,
{
    Appointment::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves all appointments booked under a phone number, in creation order.
pub async fn get_appointments_for_phone<C>(db: &C, phone: &str) -> Result<Vec<appointment::Model>>
where
    C: ConnectionTrait,
{
    Appointment::find()
        .filter(appointment::Column::Phone.eq(phone))
        .order_by_asc(appointment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_required<C>(db: &C, id: i64) -> Result<appointment::Model>
where
    C: ConnectionTrait,
{
    get_appointment_by_id(db, id)
        .await?
        .ok_or(Error::AppointmentNotFound { id })
}

/// Books a new appointment with its workflow reset to "not started".
///
/// Monthly plans receive `fields.monthly_baths` credits, or the policy default,
/// and an expiry counted from the scheduled date when the policy has one.
///
/// # Errors
/// Returns an error if:
/// - The pet name, owner or phone is blank
/// - The duration is not positive
/// - The plan credit override is negative
pub async fn create_appointment<C>(
    db: &C,
    fields: NewAppointment,
    policy: &PlanPolicy,
) -> Result<appointment::Model>
where
    C: ConnectionTrait,
{
    require_text("Pet name", &fields.pet_name)?;
    require_text("Owner", &fields.owner)?;
    require_text("Phone", &fields.phone)?;

    let schedule_end_date = match fields.duration_minutes {
        Some(minutes) if minutes <= 0 => {
            return Err(Error::Validation {
                message: format!("Duration must be positive, got {minutes} minutes"),
            });
        }
        Some(minutes) => Some(fields.schedule_date + TimeDelta::minutes(minutes)),
        None => None,
    };

    let (monthly_baths_remaining, plan_expires_at) =
        if fields.service_kind == ServiceKind::MonthlyPlan {
            let baths = fields.monthly_baths.unwrap_or(policy.default_baths);
            if baths < 0 {
                return Err(Error::InvalidAmount {
                    amount: f64::from(baths),
                });
            }
            (Some(baths), policy.expiry_from(fields.schedule_date))
        } else {
            (None, None)
        };

    let record = appointment::ActiveModel {
        pet_name: Set(fields.pet_name.trim().to_string()),
        owner: Set(fields.owner.trim().to_string()),
        phone: Set(fields.phone.trim().to_string()),
        breed: Set(fields.breed.trim().to_string()),
        observations: Set(fields.observations),
        service_kind: Set(fields.service_kind),
        schedule_date: Set(fields.schedule_date),
        schedule_end_date: Set(schedule_end_date),
        monthly_baths_remaining: Set(monthly_baths_remaining),
        plan_expires_at: Set(plan_expires_at),
        in_service: Set(false),
        service_progress: Set(0),
        completed_today: Set(false),
        service_started_at: Set(None),
        service_ended_at: Set(None),
        created_at: Set(now()),
        ..Default::default()
    };

    let created = record.insert(db).await?;
    info!(
        "Booked {} for {} ({}) at {}",
        created.service_kind.label(),
        created.pet_name,
        created.phone,
        created.schedule_date
    );
    Ok(created)
}

/// Books the same service for every pet of an existing client.
///
/// Pets are told apart by name and breed; each gets a fresh appointment with
/// the owner and breed copied from its earliest record.
pub async fn quick_schedule(
    db: &DatabaseConnection,
    phone: &str,
    schedule: QuickSchedule,
    policy: &PlanPolicy,
) -> Result<Vec<appointment::Model>> {
    let txn = db.begin().await?;

    let existing = get_appointments_for_phone(&txn, phone).await?;
    if existing.is_empty() {
        return Err(Error::ClientNotFound {
            phone: phone.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut created = Vec::new();
    for pet in existing {
        if !seen.insert((pet.pet_name.clone(), pet.breed.clone())) {
            continue;
        }
        let fields = NewAppointment {
            pet_name: pet.pet_name,
            owner: pet.owner,
            phone: pet.phone,
            breed: pet.breed,
            observations: schedule.observations.clone(),
            service_kind: schedule.service_kind,
            schedule_date: schedule.schedule_date,
            duration_minutes: None,
            monthly_baths: None,
        };
        created.push(create_appointment(&txn, fields, policy).await?);
    }

    txn.commit().await?;
    debug!("Quick-scheduled {} pets for {}", created.len(), phone);
    Ok(created)
}

/// Moves an appointment to another day, keeping its time of day.
///
/// A scheduled end moves by the same amount, so the booked duration is kept.
#[instrument(skip(db))]
pub async fn reschedule(
    db: &DatabaseConnection,
    id: i64,
    new_date: NaiveDate,
) -> Result<appointment::Model> {
    let record = find_required(db, id).await?;

    let new_start = new_date.and_time(record.schedule_date.time());
    let delta = new_start - record.schedule_date;
    let new_end = record.schedule_end_date.map(|end| end + delta);

    let mut active: appointment::ActiveModel = record.into();
    active.schedule_date = Set(new_start);
    active.schedule_end_date = Set(new_end);
    let updated = active.update(db).await?;

    debug!("Appointment {} moved to {}", id, new_start);
    Ok(updated)
}

/// Puts a scheduled pet on the table at the first stage.
///
/// Starting a service that is already running returns it unchanged so its
/// progress is never rolled back. A completed service cannot be restarted.
#[instrument(skip(db))]
pub async fn start_service(db: &DatabaseConnection, id: i64) -> Result<appointment::Model> {
    let record = find_required(db, id).await?;

    match WorkflowState::of(&record) {
        WorkflowState::Completed => Err(invalid_transition(&record, "start")),
        WorkflowState::InProgress { step } => {
            debug!("Appointment {} already in service at step {}", id, step);
            Ok(record)
        }
        WorkflowState::Scheduled => {
            let mut active: appointment::ActiveModel = record.into();
            active.in_service = Set(true);
            active.service_progress = Set(0);
            active.service_started_at = Set(Some(now()));
            let updated = active.update(db).await?;
            info!("Started service for {} ({})", updated.pet_name, id);
            Ok(updated)
        }
    }
}

/// Moves a running service to `step`.
///
/// The step may not go backwards and must stay below the final step, which is
/// only reached through [`complete_service`].
#[instrument(skip(db))]
pub async fn advance_service(
    db: &DatabaseConnection,
    id: i64,
    step: i32,
) -> Result<appointment::Model> {
    let record = find_required(db, id).await?;

    let WorkflowState::InProgress { step: current } = WorkflowState::of(&record) else {
        return Err(invalid_transition(&record, "advance"));
    };
    if step < current {
        return Err(invalid_transition(&record, "move back a stage"));
    }
    if step >= workflow::final_step(record.service_kind) {
        return Err(invalid_transition(&record, "advance past the last stage"));
    }

    let mut active: appointment::ActiveModel = record.into();
    active.service_progress = Set(step);
    let updated = active.update(db).await?;
    debug!("Appointment {} advanced to step {}", id, step);
    Ok(updated)
}

/// Finishes a service and, for monthly plans, takes one bath credit.
///
/// Allowed from the scheduled and in-service states. Credit never drops
/// below zero and a completed service cannot be completed again.
#[instrument(skip(db))]
pub async fn complete_service(db: &DatabaseConnection, id: i64) -> Result<appointment::Model> {
    let record = find_required(db, id).await?;

    if WorkflowState::of(&record) == WorkflowState::Completed {
        return Err(invalid_transition(&record, "complete"));
    }

    let kind = record.service_kind;
    let remaining = record.monthly_baths_remaining;

    let mut active: appointment::ActiveModel = record.into();
    active.completed_today = Set(true);
    active.in_service = Set(false);
    active.service_progress = Set(workflow::final_step(kind));
    active.service_ended_at = Set(Some(now()));
    if kind == ServiceKind::MonthlyPlan {
        active.monthly_baths_remaining = Set(Some((remaining.unwrap_or(0) - 1).max(0)));
    }
    let updated = active.update(db).await?;

    info!(
        "Completed service for {} ({}); plan baths left: {:?}",
        updated.pet_name, id, updated.monthly_baths_remaining
    );
    Ok(updated)
}

/// Sets the bath credit of every monthly-plan appointment under `phone`.
///
/// When `valid_until` is given the plan expiry moves there as well; otherwise
/// the existing expiry is kept. Appointments of other phones are untouched.
///
/// # Errors
/// Returns `Error::InvalidAmount` for a non-positive bath count and
/// `Error::PlanNotFound` when the phone has no monthly-plan appointment.
#[instrument(skip(db))]
pub async fn renew_plan<C>(
    db: &C,
    phone: &str,
    bath_count: i32,
    valid_until: Option<NaiveDateTime>,
) -> Result<Vec<appointment::Model>>
where
    C: ConnectionTrait,
{
    if bath_count <= 0 {
        return Err(Error::InvalidAmount {
            amount: f64::from(bath_count),
        });
    }

    let plans = Appointment::find()
        .filter(appointment::Column::Phone.eq(phone))
        .filter(appointment::Column::ServiceKind.eq(ServiceKind::MonthlyPlan))
        .order_by_asc(appointment::Column::Id)
        .all(db)
        .await?;

    if plans.is_empty() {
        return Err(Error::PlanNotFound {
            phone: phone.to_string(),
        });
    }

    let mut renewed = Vec::with_capacity(plans.len());
    for plan in plans {
        let mut active: appointment::ActiveModel = plan.into();
        active.monthly_baths_remaining = Set(Some(bath_count));
        if valid_until.is_some() {
            active.plan_expires_at = Set(valid_until);
        }
        renewed.push(active.update(db).await?);
    }

    info!(
        "Renewed {} plan appointment(s) for {} with {} baths",
        renewed.len(),
        phone,
        bath_count
    );
    Ok(renewed)
}

/// Takes one bath credit from a monthly-plan appointment without touching its
/// workflow state. Used when checkout covers a bath with the plan.
///
/// # Errors
/// Returns `Error::PlanNotFound` if the appointment is not a monthly plan.
#[instrument(skip(db))]
pub async fn redeem_plan_bath<C>(db: &C, id: i64) -> Result<appointment::Model>
where
    C: ConnectionTrait,
{
    let record = find_required(db, id).await?;
    if record.service_kind != ServiceKind::MonthlyPlan {
        return Err(Error::PlanNotFound {
            phone: record.phone,
        });
    }

    let remaining = (record.monthly_baths_remaining.unwrap_or(0) - 1).max(0);
    let mut active: appointment::ActiveModel = record.into();
    active.monthly_baths_remaining = Set(Some(remaining));
    let updated = active.update(db).await?;
    debug!("Redeemed plan bath on {}; {} left", id, remaining);
    Ok(updated)
}
