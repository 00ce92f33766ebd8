//! Client projection.
//!
//! A client is not stored anywhere: it is every appointment sharing one phone
//! number, recomputed from the appointment table on each read.

use crate::{
    core::appointment,
    entities::{ServiceKind, appointment as appointment_entity},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashSet;

/// All appointments booked under one phone number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    /// Owner name, taken from the first appointment seen
    pub owner: String,
    /// Identity key
    pub phone: String,
    /// The client's appointments in creation order
    pub appointments: Vec<appointment_entity::Model>,
}

impl Client {
    /// Monthly-plan appointments of this client.
    pub fn plan_appointments(&self) -> impl Iterator<Item = &appointment_entity::Model> {
        self.appointments
            .iter()
            .filter(|a| a.service_kind == ServiceKind::MonthlyPlan)
    }

    /// Whether any plan appointment is unexpired at `now`, regardless of credit.
    #[must_use]
    pub fn has_active_plan(&self, now: NaiveDateTime) -> bool {
        self.plan_appointments().any(|a| plan_is_current(a, now))
    }

    /// Bath credit left on the client's first plan appointment.
    #[must_use]
    pub fn plan_baths_remaining(&self) -> Option<i32> {
        self.plan_appointments()
            .next()
            .and_then(|a| a.monthly_baths_remaining)
    }

    /// One record per distinct pet (name and breed), earliest first.
    #[must_use]
    pub fn pets(&self) -> Vec<&appointment_entity::Model> {
        let mut seen = HashSet::new();
        self.appointments
            .iter()
            .filter(|a| seen.insert((a.pet_name.as_str(), a.breed.as_str())))
            .collect()
    }
}

fn plan_is_current(record: &appointment_entity::Model, now: NaiveDateTime) -> bool {
    record.plan_expires_at.is_none_or(|expires| expires > now)
}

/// Whether a plan credit can pay for a bath on this appointment at `now`:
/// it is a monthly plan, has credit left and has not expired.
#[must_use]
pub fn has_plan_credit(record: &appointment_entity::Model, now: NaiveDateTime) -> bool {
    record.service_kind == ServiceKind::MonthlyPlan
        && record.monthly_baths_remaining.unwrap_or(0) > 0
        && plan_is_current(record, now)
}

/// Groups appointments by phone, keeping the order in which phones first appear.
#[must_use]
pub fn group_by_phone(appointments: &[appointment_entity::Model]) -> Vec<Client> {
    let mut clients: Vec<Client> = Vec::new();
    for record in appointments {
        match clients.iter_mut().find(|c| c.phone == record.phone) {
            Some(client) => client.appointments.push(record.clone()),
            None => clients.push(Client {
                owner: record.owner.clone(),
                phone: record.phone.clone(),
                appointments: vec![record.clone()],
            }),
        }
    }
    clients
}

/// Filters clients by a case-insensitive owner match or a phone substring.
/// An empty query keeps every client.
#[must_use]
pub fn search_clients<'a>(clients: &'a [Client], query: &str) -> Vec<&'a Client> {
    let needle = query.trim().to_lowercase();
    clients
        .iter()
        .filter(|c| c.owner.to_lowercase().contains(&needle) || c.phone.contains(query.trim()))
        .collect()
}

/// Lists every client derived from the current appointment table.
pub async fn list_clients(db: &DatabaseConnection) -> Result<Vec<Client>> {
    let appointments = appointment::get_all_appointments(db).await?;
    Ok(group_by_phone(&appointments))
}

/// Builds the client for `phone`.
///
/// # Errors
/// Returns `Error::ClientNotFound` if no appointment uses that phone.
pub async fn find_client(db: &DatabaseConnection, phone: &str) -> Result<Client> {
    let appointments = appointment::get_appointments_for_phone(db, phone).await?;
    group_by_phone(&appointments)
        .into_iter()
        .next()
        .ok_or_else(|| Error::ClientNotFound {
            phone: phone.to_string(),
        })
}
