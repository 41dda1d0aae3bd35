//! REST request and response bodies.
//!
//! Wire types are deliberately stringly: identifiers travel as canonical
//! 32-hex strings, enum codes as their `snake_case` spelling, and timestamps
//! as RFC 3339. Handlers parse these into core types at the boundary and
//! reject bad input with 400s before any service call.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wardline_core::model::{Admission, Bed, BedAssignment, BedStatusLog, Room};

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Rooms and beds
// ---------------------------------------------------------------------------

#[derive(Deserialize, ToSchema)]
pub struct CreateRoomReq {
    /// Facility-wide unique room number, e.g. `3-301`.
    pub room_number: String,
    /// One of `ward`, `semi_private`, `private`, `icu`, `isolation`.
    pub room_type: String,
    pub floor: i16,
    pub department: String,
    pub bed_capacity: u8,
}

#[derive(Deserialize, ToSchema)]
pub struct SetRoomOperationalReq {
    pub operational: bool,
}

#[derive(Serialize, ToSchema)]
pub struct RoomRes {
    pub id: String,
    pub room_number: String,
    pub room_type: String,
    pub floor: i16,
    pub department: String,
    pub bed_capacity: u8,
    pub operational: bool,
    pub created_at: String,
}

impl From<Room> for RoomRes {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.to_string(),
            room_number: room.room_number.to_string(),
            room_type: room.room_type.to_string(),
            floor: room.floor,
            department: room.department.to_string(),
            bed_capacity: room.bed_capacity,
            operational: room.operational,
            created_at: room.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateBedReq {
    /// Unique within the room, e.g. `A`.
    pub bed_number: String,
    /// One of `standard`, `electric`, `icu`, `bariatric`, `paediatric`.
    pub bed_type: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BedRes {
    pub id: String,
    pub room_id: String,
    pub bed_number: String,
    pub bed_type: String,
    pub status: String,
    pub capabilities: Vec<String>,
    pub last_cleaned_at: Option<String>,
    pub created_at: String,
}

impl From<Bed> for BedRes {
    fn from(bed: Bed) -> Self {
        Self {
            id: bed.id.to_string(),
            room_id: bed.room_id.to_string(),
            bed_number: bed.bed_number.to_string(),
            bed_type: bed.bed_type.to_string(),
            status: bed.status.to_string(),
            capabilities: bed.capabilities,
            last_cleaned_at: bed.last_cleaned_at.map(|t| t.to_rfc3339()),
            created_at: bed.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct BedStatusChangeReq {
    /// Target status; allocation-only statuses are rejected.
    pub status: String,
    /// Staff member performing the change.
    pub actor_id: String,
    pub reason: String,
    pub related_admission_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BedStatusLogRes {
    pub id: String,
    pub bed_id: String,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: String,
    pub reason: String,
    pub related_admission_id: Option<String>,
    pub related_assignment_id: Option<String>,
    pub changed_at: String,
}

impl From<BedStatusLog> for BedStatusLogRes {
    fn from(row: BedStatusLog) -> Self {
        Self {
            id: row.id.to_string(),
            bed_id: row.bed_id.to_string(),
            old_status: row.old_status.to_string(),
            new_status: row.new_status.to_string(),
            changed_by: row.changed_by.to_string(),
            reason: row.reason,
            related_admission_id: row.related_admission_id.map(|id| id.to_string()),
            related_assignment_id: row.related_assignment_id.map(|id| id.to_string()),
            changed_at: row.changed_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BedHistoryRes {
    pub entries: Vec<BedStatusLogRes>,
}

/// Query filter for `GET /beds`.
#[derive(Deserialize)]
pub struct ListBedsQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub bed_type: Option<String>,
    pub department: Option<String>,
    pub floor: Option<i16>,
}

#[derive(Serialize, ToSchema)]
pub struct OccupantRes {
    /// `None` when the bed is unoccupied.
    pub admission: Option<AdmissionRes>,
    pub assignment: Option<AssignmentRes>,
}

// ---------------------------------------------------------------------------
// Admissions
// ---------------------------------------------------------------------------

#[derive(Deserialize, ToSchema)]
pub struct CreateAdmissionReq {
    pub patient_id: String,
    pub doctor_id: String,
    pub originating_appointment_id: Option<String>,
    /// One of `elective`, `emergency`, `transfer`, `delivery`.
    pub admission_type: String,
    /// One of `emergency_room`, `outpatient`, `referral`, `direct`.
    pub source: String,
    pub diagnosis: String,
    pub expected_discharge_date: Option<String>,
    /// When present, the bed is assigned in the same unit of work.
    pub bed_id: Option<String>,
    /// Staff member performing intake; defaults to the doctor.
    pub actor_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RequestDischargeReq {
    pub doctor_id: String,
    pub summary: String,
    pub expected_discharge_date: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct FinalizeDischargeReq {
    pub actor_id: String,
    /// One of `routine`, `against_medical_advice`, `transfer`, `deceased`.
    pub discharge_type: String,
    pub condition_on_discharge: Option<String>,
    pub follow_up_instructions: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelDischargeReq {
    pub actor_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TransferBedReq {
    pub new_bed_id: String,
    pub actor_id: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct AdmissionRes {
    pub id: String,
    pub admission_number: String,
    pub patient_id: String,
    pub attending_doctor_id: String,
    pub originating_appointment_id: Option<String>,
    pub admission_type: String,
    pub source: String,
    pub admitting_diagnosis: String,
    pub status: String,
    pub admitted_at: String,
    pub expected_discharge_date: Option<String>,
    pub discharge_date: Option<String>,
    pub discharge_type: Option<String>,
    pub discharge_summary: Option<String>,
    pub condition_on_discharge: Option<String>,
    pub follow_up_instructions: Option<String>,
    /// Frozen at discharge; derived from the clock while the stay is open.
    pub length_of_stay_days: i64,
}

impl AdmissionRes {
    pub fn from_admission(admission: Admission, length_of_stay_days: i64) -> Self {
        Self {
            id: admission.id.to_string(),
            admission_number: admission.admission_number,
            patient_id: admission.patient_id.to_string(),
            attending_doctor_id: admission.attending_doctor_id.to_string(),
            originating_appointment_id: admission
                .originating_appointment_id
                .map(|id| id.to_string()),
            admission_type: admission.admission_type.to_string(),
            source: admission.source.to_string(),
            admitting_diagnosis: admission.admitting_diagnosis.to_string(),
            status: admission.status.to_string(),
            admitted_at: admission.admitted_at.to_rfc3339(),
            expected_discharge_date: admission.expected_discharge_date.map(|t| t.to_rfc3339()),
            discharge_date: admission.discharge_date.map(|t| t.to_rfc3339()),
            discharge_type: admission.discharge_type.map(|t| t.to_string()),
            discharge_summary: admission.discharge_summary,
            condition_on_discharge: admission.condition_on_discharge,
            follow_up_instructions: admission.follow_up_instructions,
            length_of_stay_days,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AssignmentRes {
    pub id: String,
    pub admission_id: String,
    pub bed_id: String,
    pub assigned_at: String,
    pub released_at: Option<String>,
    pub assigned_by: String,
    pub release_reason: Option<String>,
}

impl From<BedAssignment> for AssignmentRes {
    fn from(assignment: BedAssignment) -> Self {
        Self {
            id: assignment.id.to_string(),
            admission_id: assignment.admission_id.to_string(),
            bed_id: assignment.bed_id.to_string(),
            assigned_at: assignment.assigned_at.to_rfc3339(),
            released_at: assignment.released_at.map(|t| t.to_rfc3339()),
            assigned_by: assignment.assigned_by.to_string(),
            release_reason: assignment.release_reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

#[derive(Serialize, ToSchema)]
pub struct NextSequenceRes {
    pub value: String,
}
