//! Hand-off entity - One-shot JSON envelopes passed from the scheduling side
//! to checkout. Keyed by a fixed name; a row is deleted as soon as it is read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hand-off database model - stores one pending envelope per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "handoffs")]
pub struct Model {
    /// Envelope key (e.g., `"pendingPlanRenewal"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// JSON payload
    pub value: String,
    /// When the envelope was written
    pub updated_at: DateTime,
}

/// `Handoff` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
