//! Calendar and dashboard read views.
//!
//! Day and range listings for the calendar, the stage board that shows which
//! pets are at which step, and the counters on the home screen. Everything here
//! is derived from the appointment table; nothing is stored.

use crate::{
    core::workflow::{self, ServiceStage, WorkflowState},
    entities::{Appointment, appointment},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;

/// Appointments grouped under one stage of the stepper.
#[derive(Debug, Clone, Serialize)]
pub struct StageColumn {
    /// Stage shown as the column header
    pub stage: ServiceStage,
    /// Pets currently at this stage, earliest slot first
    pub appointments: Vec<appointment::Model>,
}

/// Home-screen counters for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    /// Booked, not started
    pub scheduled: usize,
    /// On the table
    pub in_progress: usize,
    /// Finished
    pub completed: usize,
}

impl DailySummary {
    /// All appointments of the day.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.scheduled + self.in_progress + self.completed
    }
}

/// Appointments whose slot starts in `[from, to)`, earliest first.
pub async fn appointments_between(
    db: &DatabaseConnection,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<appointment::Model>> {
    Appointment::find()
        .filter(appointment::Column::ScheduleDate.gte(from))
        .filter(appointment::Column::ScheduleDate.lt(to))
        .order_by_asc(appointment::Column::ScheduleDate)
        .order_by_asc(appointment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Appointments of one calendar day, earliest first.
pub async fn appointments_on(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<Vec<appointment::Model>> {
    let from = date.and_time(NaiveTime::MIN);
    let to = date
        .succ_opt()
        .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN));
    appointments_between(db, from, to).await
}

/// Groups in-service appointments by their current stage, in stepper order.
/// Stages with nobody on them are left out.
pub async fn stage_board(db: &DatabaseConnection) -> Result<Vec<StageColumn>> {
    let running = Appointment::find()
        .filter(appointment::Column::InService.eq(true))
        .filter(appointment::Column::CompletedToday.eq(false))
        .order_by_asc(appointment::Column::ScheduleDate)
        .all(db)
        .await?;

    let order = [
        ServiceStage::Bath,
        ServiceStage::Drying,
        ServiceStage::Trim,
        ServiceStage::Finish,
    ];
    let mut columns: Vec<StageColumn> = order
        .iter()
        .map(|&stage| StageColumn {
            stage,
            appointments: Vec::new(),
        })
        .collect();

    for record in running {
        if let Some(stage) = workflow::current_stage(&record) {
            if let Some(column) = columns.iter_mut().find(|c| c.stage == stage) {
                column.appointments.push(record);
            }
        }
    }

    columns.retain(|c| !c.appointments.is_empty());
    Ok(columns)
}

/// Counts the day's appointments by workflow state.
pub async fn daily_summary(db: &DatabaseConnection, date: NaiveDate) -> Result<DailySummary> {
    let mut summary = DailySummary::default();
    for record in appointments_on(db, date).await? {
        match WorkflowState::of(&record) {
            WorkflowState::Scheduled => summary.scheduled += 1,
            WorkflowState::InProgress { .. } => summary.in_progress += 1,
            WorkflowState::Completed => summary.completed += 1,
        }
    }
    Ok(summary)
}
