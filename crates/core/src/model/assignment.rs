//! The allocation ledger rows: admission-to-bed bindings over time.

use crate::id::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binds one admission to one bed for the interval `[assigned_at, released_at)`.
///
/// An assignment with `released_at = None` is *open*: the active binding.
/// The ledger maintains two invariants at all times:
///
/// - at most one open assignment per admission, and
/// - at most one open assignment per bed.
///
/// Opening a new assignment for an admission implicitly closes its previous
/// one (a transfer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BedAssignment {
    pub id: RecordId,
    pub admission_id: RecordId,
    pub bed_id: RecordId,
    pub assigned_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    /// Staff member who performed the assignment.
    pub assigned_by: RecordId,
    /// Why the binding ended: a transfer reason or a release reason.
    pub release_reason: Option<String>,
}

impl BedAssignment {
    /// True while this is the admission's current binding.
    pub fn is_open(&self) -> bool {
        self.released_at.is_none()
    }
}
