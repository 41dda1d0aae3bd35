//! Discharge sync outbox rows.
//!
//! Finalising a discharge stages exactly one event here, in the same unit of
//! work as the discharge itself. A separate drain pass delivers staged events
//! to the downstream gateway and marks them delivered; delivery failures
//! never touch the committed discharge.

use crate::id::RecordId;
use crate::model::DischargeType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload sent to the discharge sync gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DischargeNotice {
    pub patient_id: RecordId,
    pub admission_number: String,
    pub discharge_datetime: DateTime<Utc>,
    pub diagnosis: String,
    pub discharge_type: DischargeType,
    pub condition_on_discharge: Option<String>,
    pub follow_up_instructions: Option<String>,
}

/// One staged (or delivered) downstream notification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: RecordId,
    pub admission_id: RecordId,
    pub notice: DischargeNotice,
    pub created_at: DateTime<Utc>,
    /// Delivery attempts so far.
    pub attempts: u32,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Message from the most recent failed attempt.
    pub last_error: Option<String>,
}

impl OutboxEvent {
    /// True when the event still needs delivery.
    pub fn is_pending(&self) -> bool {
        self.delivered_at.is_none()
    }
}
