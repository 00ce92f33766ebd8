//! Service-progress workflow.
//!
//! Every grooming service walks a short, fixed list of stages. An appointment's
//! `service_progress` is an index into that list; reaching `final_step` means the
//! service is finished. This module derives the per-appointment state machine
//! from the stored flags:
//!
//! ```text
//! Scheduled --start--> InProgress(0) --advance--> InProgress(n) --complete--> Completed
//! ```

use crate::entities::{ServiceKind, appointment};
use serde::Serialize;
use std::fmt;

/// One named step of the grooming stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceStage {
    /// Washing
    Bath,
    /// Blow-drying
    Drying,
    /// Clipping and scissoring
    Trim,
    /// Brushing, perfume, bow
    Finish,
}

impl ServiceStage {
    /// Label shown on the stepper and the stage board.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bath => "Bath",
            Self::Drying => "Drying",
            Self::Trim => "Trim",
            Self::Finish => "Finish",
        }
    }
}

const BATH_STAGES: [ServiceStage; 3] = [ServiceStage::Bath, ServiceStage::Drying, ServiceStage::Finish];

const TRIM_STAGES: [ServiceStage; 4] = [
    ServiceStage::Bath,
    ServiceStage::Drying,
    ServiceStage::Trim,
    ServiceStage::Finish,
];

/// Ordered stages for a service kind.
#[must_use]
pub fn stages_for(kind: ServiceKind) -> &'static [ServiceStage] {
    if kind.includes_trim() {
        &TRIM_STAGES
    } else {
        &BATH_STAGES
    }
}

/// Progress value of a finished service: one past the last stage index.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn final_step(kind: ServiceKind) -> i32 {
    stages_for(kind).len() as i32
}

/// Workflow sub-state of one appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Booked, not yet on the table
    Scheduled,
    /// Being groomed, currently at `step`
    InProgress {
        /// Index of the current stage
        step: i32,
    },
    /// Finished; terminal
    Completed,
}

impl WorkflowState {
    /// Derives the state from a stored record.
    #[must_use]
    pub const fn of(record: &appointment::Model) -> Self {
        if record.completed_today {
            Self::Completed
        } else if record.in_service {
            Self::InProgress {
                step: record.service_progress,
            }
        } else {
            Self::Scheduled
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::InProgress { step } => write!(f, "in progress at step {step}"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Stage the appointment is currently at, or `None` unless it is in service.
#[must_use]
pub fn current_stage(record: &appointment::Model) -> Option<ServiceStage> {
    match WorkflowState::of(record) {
        WorkflowState::InProgress { step } => usize::try_from(step)
            .ok()
            .and_then(|i| stages_for(record.service_kind).get(i).copied()),
        WorkflowState::Scheduled | WorkflowState::Completed => None,
    }
}
