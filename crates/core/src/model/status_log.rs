//! Append-only audit log of bed status transitions.

use crate::id::RecordId;
use crate::model::BedStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted bed-status transition.
///
/// Rows are appended in the same unit of work as the status change itself and
/// are never updated or deleted. Every accepted change produces exactly one
/// row; a change with no row (or a row with no change) is a defect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BedStatusLog {
    pub id: RecordId,
    pub bed_id: RecordId,
    pub old_status: BedStatus,
    pub new_status: BedStatus,
    /// Staff member or system actor that caused the change.
    pub changed_by: RecordId,
    pub reason: String,
    pub related_admission_id: Option<RecordId>,
    pub related_assignment_id: Option<RecordId>,
    pub changed_at: DateTime<Utc>,
}
