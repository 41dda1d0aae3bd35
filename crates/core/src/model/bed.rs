//! Beds and the bed status state machine.

use crate::error::WardError;
use crate::id::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wardline_types::NonEmptyText;

/// Operational status of a bed.
///
/// Status is never set directly by clinical staff: `Occupied` is entered only
/// through allocation, `Cleaning` only through release. The remaining
/// transitions are explicit staff actions validated by
/// [`BedStatus::staff_change_allowed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedStatus {
    Available,
    Occupied,
    Maintenance,
    Reserved,
    Cleaning,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Occupied => "occupied",
            BedStatus::Maintenance => "maintenance",
            BedStatus::Reserved => "reserved",
            BedStatus::Cleaning => "cleaning",
        }
    }

    /// Whether a *staff action* may move a bed from `self` to `to`.
    ///
    /// Allocation-only transitions (`Available -> Occupied`,
    /// `Occupied -> Cleaning`) are excluded here: they are driven by the
    /// allocation ledger, never requested directly.
    ///
    /// Maintenance may be entered from any state. Taking an occupied bed into
    /// maintenance is legal (equipment failures do not wait for discharge)
    /// but is flagged as a conflict by the registry when an open assignment
    /// exists.
    pub fn staff_change_allowed(self, to: BedStatus) -> bool {
        use BedStatus::*;
        if self == to {
            return false;
        }
        matches!(
            (self, to),
            (Available, Reserved)
                | (Reserved, Available)
                | (Cleaning, Available)
                | (Maintenance, Available)
                | (_, Maintenance)
        )
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedStatus {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BedStatus::Available),
            "occupied" => Ok(BedStatus::Occupied),
            "maintenance" => Ok(BedStatus::Maintenance),
            "reserved" => Ok(BedStatus::Reserved),
            "cleaning" => Ok(BedStatus::Cleaning),
            other => Err(WardError::InvalidInput(format!(
                "unknown bed status: '{other}'"
            ))),
        }
    }
}

/// Physical bed classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    Standard,
    Electric,
    Icu,
    Bariatric,
    Paediatric,
}

impl BedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedType::Standard => "standard",
            BedType::Electric => "electric",
            BedType::Icu => "icu",
            BedType::Bariatric => "bariatric",
            BedType::Paediatric => "paediatric",
        }
    }
}

impl fmt::Display for BedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedType {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(BedType::Standard),
            "electric" => Ok(BedType::Electric),
            "icu" => Ok(BedType::Icu),
            "bariatric" => Ok(BedType::Bariatric),
            "paediatric" => Ok(BedType::Paediatric),
            other => Err(WardError::InvalidInput(format!(
                "unknown bed type: '{other}'"
            ))),
        }
    }
}

/// A bed. Owned by exactly one room; `bed_number` is unique within it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bed {
    pub id: RecordId,
    pub room_id: RecordId,
    /// Unique within the owning room, e.g. `A`.
    pub bed_number: NonEmptyText,
    pub bed_type: BedType,
    pub status: BedStatus,
    /// Capability tags, e.g. `ventilator`, `negative-pressure`.
    pub capabilities: Vec<String>,
    pub last_cleaned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for bed creation. New beds start `Available`.
#[derive(Clone, Debug)]
pub struct NewBed {
    pub bed_number: NonEmptyText,
    pub bed_type: BedType,
    pub capabilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BedStatus::*;

    #[test]
    fn staff_table_matches_contract() {
        // available <-> reserved
        assert!(Available.staff_change_allowed(Reserved));
        assert!(Reserved.staff_change_allowed(Available));
        // cleaning -> available
        assert!(Cleaning.staff_change_allowed(Available));
        // maintenance from anywhere, back to available only
        assert!(Occupied.staff_change_allowed(Maintenance));
        assert!(Reserved.staff_change_allowed(Maintenance));
        assert!(Maintenance.staff_change_allowed(Available));
        assert!(!Maintenance.staff_change_allowed(Cleaning));
    }

    #[test]
    fn allocation_transitions_are_not_staff_actions() {
        assert!(!Available.staff_change_allowed(Occupied));
        assert!(!Occupied.staff_change_allowed(Cleaning));
    }

    #[test]
    fn no_op_transition_is_rejected() {
        assert!(!Available.staff_change_allowed(Available));
        assert!(!Maintenance.staff_change_allowed(Maintenance));
    }
}
