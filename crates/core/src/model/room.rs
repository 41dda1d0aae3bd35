//! Rooms: the static-ish half of the physical capacity model.

use crate::error::WardError;
use crate::id::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wardline_types::NonEmptyText;

/// Classification of a room's accommodation level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Ward,
    SemiPrivate,
    Private,
    Icu,
    Isolation,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Ward => "ward",
            RoomType::SemiPrivate => "semi_private",
            RoomType::Private => "private",
            RoomType::Icu => "icu",
            RoomType::Isolation => "isolation",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ward" => Ok(RoomType::Ward),
            "semi_private" => Ok(RoomType::SemiPrivate),
            "private" => Ok(RoomType::Private),
            "icu" => Ok(RoomType::Icu),
            "isolation" => Ok(RoomType::Isolation),
            other => Err(WardError::InvalidInput(format!(
                "unknown room type: '{other}'"
            ))),
        }
    }
}

/// A physical room. Immutable after creation except the operational flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub id: RecordId,
    /// Facility-wide unique room number, e.g. `3-101`.
    pub room_number: NonEmptyText,
    pub room_type: RoomType,
    pub floor: i16,
    /// Owning department, e.g. `general-medicine`.
    pub department: NonEmptyText,
    /// Maximum number of beds this room may hold.
    pub bed_capacity: u8,
    /// Non-operational rooms keep their beds but accept no new allocations.
    pub operational: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for room creation.
#[derive(Clone, Debug)]
pub struct NewRoom {
    pub room_number: NonEmptyText,
    pub room_type: RoomType,
    pub floor: i16,
    pub department: NonEmptyText,
    pub bed_capacity: u8,
}
