//! Admissions: one inpatient stay from intake to discharge, transfer, or death.

use crate::error::WardError;
use crate::id::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wardline_types::NonEmptyText;

/// Lifecycle state of an admission.
///
/// `Active -> PendingDischarge -> {Discharged, Transferred, Deceased}`, with
/// `PendingDischarge -> Active` as the only backwards edge (a cancelled
/// discharge request). Terminal states accept no further transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Active,
    PendingDischarge,
    Discharged,
    Transferred,
    Deceased,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionStatus::Active => "active",
            AdmissionStatus::PendingDischarge => "pending_discharge",
            AdmissionStatus::Discharged => "discharged",
            AdmissionStatus::Transferred => "transferred",
            AdmissionStatus::Deceased => "deceased",
        }
    }

    /// Terminal states are immutable except for corrective audit entries.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AdmissionStatus::Discharged | AdmissionStatus::Transferred | AdmissionStatus::Deceased
        )
    }

    /// Legality of a single state-machine edge.
    pub fn can_transition_to(self, to: AdmissionStatus) -> bool {
        use AdmissionStatus::*;
        matches!(
            (self, to),
            (Active, PendingDischarge)
                | (PendingDischarge, Active)
                | (PendingDischarge, Discharged)
                | (PendingDischarge, Transferred)
                | (PendingDischarge, Deceased)
        )
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the stay was arranged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionType {
    Elective,
    Emergency,
    Transfer,
    Delivery,
}

impl AdmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionType::Elective => "elective",
            AdmissionType::Emergency => "emergency",
            AdmissionType::Transfer => "transfer",
            AdmissionType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionType {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elective" => Ok(AdmissionType::Elective),
            "emergency" => Ok(AdmissionType::Emergency),
            "transfer" => Ok(AdmissionType::Transfer),
            "delivery" => Ok(AdmissionType::Delivery),
            other => Err(WardError::InvalidInput(format!(
                "unknown admission type: '{other}'"
            ))),
        }
    }
}

/// Where the patient came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionSource {
    EmergencyRoom,
    Outpatient,
    Referral,
    Direct,
}

impl AdmissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionSource::EmergencyRoom => "emergency_room",
            AdmissionSource::Outpatient => "outpatient",
            AdmissionSource::Referral => "referral",
            AdmissionSource::Direct => "direct",
        }
    }
}

impl fmt::Display for AdmissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionSource {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emergency_room" => Ok(AdmissionSource::EmergencyRoom),
            "outpatient" => Ok(AdmissionSource::Outpatient),
            "referral" => Ok(AdmissionSource::Referral),
            "direct" => Ok(AdmissionSource::Direct),
            other => Err(WardError::InvalidInput(format!(
                "unknown admission source: '{other}'"
            ))),
        }
    }
}

/// Administrative classification of a finalised discharge.
///
/// Determines the terminal admission status: `Transfer` ends the stay as
/// `Transferred`, `Deceased` as `Deceased`, everything else as `Discharged`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeType {
    Routine,
    AgainstMedicalAdvice,
    Transfer,
    Deceased,
}

impl DischargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DischargeType::Routine => "routine",
            DischargeType::AgainstMedicalAdvice => "against_medical_advice",
            DischargeType::Transfer => "transfer",
            DischargeType::Deceased => "deceased",
        }
    }

    /// The terminal admission status this discharge type produces.
    pub fn terminal_status(self) -> AdmissionStatus {
        match self {
            DischargeType::Transfer => AdmissionStatus::Transferred,
            DischargeType::Deceased => AdmissionStatus::Deceased,
            DischargeType::Routine | DischargeType::AgainstMedicalAdvice => {
                AdmissionStatus::Discharged
            }
        }
    }
}

impl fmt::Display for DischargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DischargeType {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routine" => Ok(DischargeType::Routine),
            "against_medical_advice" => Ok(DischargeType::AgainstMedicalAdvice),
            "transfer" => Ok(DischargeType::Transfer),
            "deceased" => Ok(DischargeType::Deceased),
            other => Err(WardError::InvalidInput(format!(
                "unknown discharge type: '{other}'"
            ))),
        }
    }
}

/// One inpatient stay.
///
/// `length_of_stay_days` is `None` while the stay is open; it is computed and
/// frozen by discharge finalisation. For active admissions the current value
/// is derived on demand (see `AdmissionsService::length_of_stay_days`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Admission {
    pub id: RecordId,
    /// System-issued human-readable identifier, e.g. `ADM-2026-000042`.
    pub admission_number: String,
    pub patient_id: RecordId,
    pub attending_doctor_id: RecordId,
    pub originating_appointment_id: Option<RecordId>,
    pub admission_type: AdmissionType,
    pub source: AdmissionSource,
    pub admitting_diagnosis: NonEmptyText,
    pub status: AdmissionStatus,
    pub admitted_at: DateTime<Utc>,
    pub expected_discharge_date: Option<DateTime<Utc>>,
    pub discharge_date: Option<DateTime<Utc>>,
    pub discharge_type: Option<DischargeType>,
    pub discharge_summary: Option<String>,
    pub condition_on_discharge: Option<String>,
    pub follow_up_instructions: Option<String>,
    pub length_of_stay_days: Option<i64>,
}

/// Input for admission intake.
#[derive(Clone, Debug)]
pub struct NewAdmission {
    pub patient_id: RecordId,
    pub attending_doctor_id: RecordId,
    pub originating_appointment_id: Option<RecordId>,
    pub admission_type: AdmissionType,
    pub source: AdmissionSource,
    pub admitting_diagnosis: NonEmptyText,
    pub expected_discharge_date: Option<DateTime<Utc>>,
    /// When supplied, the bed is assigned in the same unit of work as intake.
    pub bed_id: Option<RecordId>,
}
