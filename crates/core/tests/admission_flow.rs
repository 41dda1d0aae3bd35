//! End-to-end admission lifecycle: intake with placement, a rejected
//! discharge request, the attending doctor's request, finalisation, and the
//! downstream notice.

use std::sync::Mutex;

use wardline_core::model::{
    AdmissionSource, AdmissionStatus, AdmissionType, BedStatus, BedType, DischargeNotice,
    DischargeType, NewAdmission, NewBed, NewRoom, RoomType,
};
use wardline_core::sync::{drain_outbox, DischargeSync, SyncError};
use wardline_core::{CoreConfig, RecordId, WardError, WardServices};
use wardline_types::NonEmptyText;

fn text(s: &str) -> NonEmptyText {
    NonEmptyText::new(s).unwrap()
}

fn services() -> WardServices {
    let cfg = CoreConfig::new(None, text("integration")).unwrap();
    WardServices::open(&cfg).unwrap()
}

struct RecordingSync {
    seen: Mutex<Vec<String>>,
}

impl DischargeSync for RecordingSync {
    fn notify(&self, notice: &DischargeNotice) -> Result<(), SyncError> {
        self.seen
            .lock()
            .unwrap()
            .push(notice.admission_number.clone());
        Ok(())
    }
}

#[test]
fn admission_lifecycle_end_to_end() {
    let services = services();

    let room = services
        .registry
        .create_room(NewRoom {
            room_number: text("3-301"),
            room_type: RoomType::Ward,
            floor: 3,
            department: text("general-medicine"),
            bed_capacity: 2,
        })
        .unwrap();
    let bed = services
        .registry
        .create_bed(
            &room.id,
            NewBed {
                bed_number: text("A"),
                bed_type: BedType::Standard,
                capabilities: vec!["oxygen".into()],
            },
        )
        .unwrap();

    let attending = RecordId::new();
    let nurse = RecordId::new();

    // Intake with placement in one unit of work.
    let admission = services
        .admissions
        .create_admission(
            NewAdmission {
                patient_id: RecordId::new(),
                attending_doctor_id: attending,
                originating_appointment_id: None,
                admission_type: AdmissionType::Emergency,
                source: AdmissionSource::EmergencyRoom,
                admitting_diagnosis: text("community acquired pneumonia"),
                expected_discharge_date: None,
                bed_id: Some(bed.id),
            },
            nurse,
        )
        .unwrap();
    assert_eq!(admission.status, AdmissionStatus::Active);

    assert_eq!(
        services.registry.bed(&bed.id).unwrap().status,
        BedStatus::Occupied
    );
    let current = services
        .allocation
        .current_bed(&admission.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, bed.id);

    // A doctor who is not the attending cannot request discharge.
    let stranger = RecordId::new();
    let denied = services
        .admissions
        .request_discharge(&admission.id, stranger, text("looks fine"), None)
        .unwrap_err();
    assert!(matches!(denied, WardError::AccessDenied { .. }));
    assert_eq!(
        services.admissions.admission(&admission.id).unwrap().status,
        AdmissionStatus::Active
    );

    // The attending doctor's request moves to pending; the bed stays occupied.
    let pending = services
        .admissions
        .request_discharge(
            &admission.id,
            attending,
            text("responded to antibiotics, ready for home"),
            None,
        )
        .unwrap();
    assert_eq!(pending.status, AdmissionStatus::PendingDischarge);
    assert_eq!(
        services.registry.bed(&bed.id).unwrap().status,
        BedStatus::Occupied
    );

    // Finalisation releases the bed and freezes the record.
    let discharged = services
        .admissions
        .finalize_discharge(
            &admission.id,
            nurse,
            DischargeType::Routine,
            Some("stable".into()),
            Some("GP review in one week".into()),
        )
        .unwrap();
    assert_eq!(discharged.status, AdmissionStatus::Discharged);
    assert!(discharged.discharge_date.is_some());
    assert!(discharged.length_of_stay_days.is_some());

    assert_eq!(
        services.registry.bed(&bed.id).unwrap().status,
        BedStatus::Cleaning
    );
    assert!(services
        .allocation
        .current_bed(&admission.id)
        .unwrap()
        .is_none());

    // The ledger row is closed: nobody occupies the bed any more.
    assert!(services.registry.occupant(&bed.id).unwrap().is_none());

    // Audit completeness: exactly one row per accepted transition, with
    // old/new matching each step.
    let history = services.registry.bed_history(&bed.id, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].old_status, BedStatus::Occupied);
    assert_eq!(history[0].new_status, BedStatus::Cleaning);
    assert_eq!(history[1].old_status, BedStatus::Available);
    assert_eq!(history[1].new_status, BedStatus::Occupied);

    // The staged notice is delivered out-of-band.
    let gateway = RecordingSync {
        seen: Mutex::new(Vec::new()),
    };
    let report = drain_outbox(&services.store, &gateway, 5).unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(
        gateway.seen.lock().unwrap().as_slice(),
        [admission.admission_number.clone()]
    );
}

#[test]
fn bed_becomes_available_again_after_cleaning() {
    let services = services();
    let room = services
        .registry
        .create_room(NewRoom {
            room_number: text("3-302"),
            room_type: RoomType::Private,
            floor: 3,
            department: text("surgery"),
            bed_capacity: 1,
        })
        .unwrap();
    let bed = services
        .registry
        .create_bed(
            &room.id,
            NewBed {
                bed_number: text("A"),
                bed_type: BedType::Electric,
                capabilities: vec![],
            },
        )
        .unwrap();

    let attending = RecordId::new();
    let admission = services
        .admissions
        .create_admission(
            NewAdmission {
                patient_id: RecordId::new(),
                attending_doctor_id: attending,
                originating_appointment_id: None,
                admission_type: AdmissionType::Elective,
                source: AdmissionSource::Outpatient,
                admitting_diagnosis: text("hernia repair"),
                expected_discharge_date: None,
                bed_id: Some(bed.id),
            },
            RecordId::new(),
        )
        .unwrap();

    services
        .admissions
        .request_discharge(&admission.id, attending, text("day case complete"), None)
        .unwrap();
    services
        .admissions
        .finalize_discharge(&admission.id, RecordId::new(), DischargeType::Routine, None, None)
        .unwrap();

    // Housekeeping returns the bed to service; the clean is stamped.
    let cleaned = services
        .registry
        .transition_bed_status(
            &bed.id,
            BedStatus::Available,
            RecordId::new(),
            text("terminal clean complete"),
            None,
        )
        .unwrap();
    assert_eq!(cleaned.status, BedStatus::Available);
    assert!(cleaned.last_cleaned_at.is_some());

    // And it can be allocated to the next admission.
    let next = services
        .admissions
        .create_admission(
            NewAdmission {
                patient_id: RecordId::new(),
                attending_doctor_id: RecordId::new(),
                originating_appointment_id: None,
                admission_type: AdmissionType::Elective,
                source: AdmissionSource::Referral,
                admitting_diagnosis: text("knee arthroscopy"),
                expected_discharge_date: None,
                bed_id: Some(bed.id),
            },
            RecordId::new(),
        )
        .unwrap();
    assert_eq!(
        services
            .allocation
            .current_bed(&next.id)
            .unwrap()
            .unwrap()
            .id,
        bed.id
    );
}
