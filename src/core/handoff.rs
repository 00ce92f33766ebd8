//! One-shot hand-off envelopes between the scheduling screens and checkout.
//!
//! The scheduling side drops a JSON envelope under a fixed key; checkout takes
//! it when it opens. Taking an envelope deletes it in the same transaction, so
//! each one is consumed exactly once.

use crate::{
    entities::{Handoff, ServiceKind, handoff},
    errors::Result,
};
use chrono::Local;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// The fixed envelope slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffKey {
    /// A freshly registered pet waiting to be charged
    PendingPetRegistration,
    /// A plan renewal requested from the client list
    PendingPlanRenewal,
    /// A scheduled service waiting to be charged
    PendingServiceSchedule,
}

impl HandoffKey {
    /// Storage key of the slot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPetRegistration => "pendingPetRegistration",
            Self::PendingPlanRenewal => "pendingPlanRenewal",
            Self::PendingServiceSchedule => "pendingServiceSchedule",
        }
    }
}

/// Envelope under [`HandoffKey::PendingPetRegistration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistration {
    /// Client phone
    pub phone: String,
    /// Registered pet
    pub pet_name: String,
    /// Pet breed
    pub breed: String,
    /// Booked service
    pub service_kind: ServiceKind,
    /// Price quoted at registration
    pub service_price: f64,
    /// Description quoted at registration
    pub service_description: String,
}

/// Envelope under [`HandoffKey::PendingPlanRenewal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRenewal {
    /// Client phone
    pub phone: String,
    /// Client name, for display
    pub owner: String,
}

/// Envelope under [`HandoffKey::PendingServiceSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSchedule {
    /// Client phone
    pub phone: String,
    /// Scheduled pet
    pub pet_name: String,
    /// Booked service
    pub service_kind: ServiceKind,
    /// Already paid for by the plan; nothing to charge
    #[serde(default)]
    pub using_plan: bool,
}

/// Writes an envelope, replacing whatever was pending under the key.
pub async fn put_handoff<T>(db: &DatabaseConnection, key: HandoffKey, payload: &T) -> Result<()>
where
    T: Serialize,
{
    let value = serde_json::to_string(payload)?;
    let row = handoff::ActiveModel {
        key: Set(key.as_str().to_string()),
        value: Set(value),
        updated_at: Set(Local::now().naive_local()),
    };

    Handoff::insert(row)
        .on_conflict(
            OnConflict::column(handoff::Column::Key)
                .update_columns([handoff::Column::Value, handoff::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;

    debug!("Hand-off '{}' written", key.as_str());
    Ok(())
}

/// Takes the envelope under `key`, deleting it.
///
/// Returns `Ok(None)` when nothing is pending. A payload that does not parse is
/// still removed and reported as `Error::Serialization`.
pub async fn take_handoff<T>(db: &DatabaseConnection, key: HandoffKey) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let txn = db.begin().await?;

    let Some(row) = Handoff::find_by_id(key.as_str()).one(&txn).await? else {
        txn.commit().await?;
        return Ok(None);
    };
    Handoff::delete_by_id(key.as_str()).exec(&txn).await?;
    txn.commit().await?;

    let payload = serde_json::from_str(&row.value).inspect_err(|e| {
        warn!("Discarded malformed hand-off '{}': {}", key.as_str(), e);
    })?;
    debug!("Hand-off '{}' consumed", key.as_str());
    Ok(Some(payload))
}
