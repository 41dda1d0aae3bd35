//! Allocation ledger: assign, transfer, and release beds.
//!
//! The ledger is the only writer of [`BedAssignment`] rows and the only
//! caller of the allocation-side bed transitions (`Available -> Occupied`,
//! `Occupied -> Cleaning`). Each public operation is one unit of work over
//! the ward store, so ledger rows, bed status, and audit rows always move
//! together.
//!
//! Invariants maintained at every commit: an admission has at most one open
//! assignment, and a bed has at most one open assignment.
//!
//! Two actors racing for the same available bed: the store serialises their
//! units of work, the second sees the bed `Occupied` (or the open-assignment
//! check trips) and receives `BedUnavailable`. There is no silent overwrite.

use crate::error::{WardError, WardResult};
use crate::id::RecordId;
use crate::model::{Admission, AdmissionStatus, Bed, BedAssignment, BedStatus};
use crate::registry::record_bed_transition;
use crate::retry::run_contended;
use crate::store::{Tables, WardStore};
use chrono::{DateTime, Utc};
use wardline_types::NonEmptyText;

fn require_active(admission: &Admission, attempted: &str) -> WardResult<()> {
    if admission.status != AdmissionStatus::Active {
        return Err(WardError::InvalidStateTransition {
            id: admission.id.to_string(),
            from: admission.status,
            attempted: attempted.to_string(),
        });
    }
    Ok(())
}

/// Assign `bed_id` to `admission_id`, closing any prior binding (a transfer).
///
/// Runs inside the caller's unit of work. `transfer_reason` is recorded on
/// the closed assignment when this call is a transfer rather than an initial
/// placement.
pub(crate) fn assign_bed_in(
    tables: &mut Tables,
    admission_id: &RecordId,
    bed_id: &RecordId,
    actor: RecordId,
    transfer_reason: Option<&str>,
    now: DateTime<Utc>,
) -> WardResult<BedAssignment> {
    let admission = tables.admission(admission_id)?;
    require_active(admission, "be assigned a bed")?;
    let admission_number = admission.admission_number.clone();

    let bed = tables.bed(bed_id)?;
    let bed_status = bed.status;
    let room = tables.room(&bed.room_id)?;
    if bed_status != BedStatus::Available || !room.operational {
        return Err(WardError::BedUnavailable {
            bed: bed_id.to_string(),
            status: bed_status,
        });
    }
    // Mirrors the uniqueness constraint on open assignments per bed: even if
    // status bookkeeping were ever wrong, a second open binding must lose.
    if tables.open_assignment_for_bed(bed_id).is_some() {
        return Err(WardError::BedUnavailable {
            bed: bed_id.to_string(),
            status: bed_status,
        });
    }

    // Close the previous binding first, vacating its bed.
    let previous = tables.open_assignment_for_admission(admission_id).cloned();
    if let Some(prev) = previous {
        let reason = transfer_reason.unwrap_or("transferred to another bed");
        if let Some(open) = tables.open_assignment_for_admission_mut(admission_id) {
            open.released_at = Some(now);
            open.release_reason = Some(reason.to_string());
        }
        record_bed_transition(
            tables,
            &prev.bed_id,
            BedStatus::Cleaning,
            actor,
            reason,
            Some(*admission_id),
            Some(prev.id),
            now,
        )?;
    }

    let assignment = BedAssignment {
        id: RecordId::new(),
        admission_id: *admission_id,
        bed_id: *bed_id,
        assigned_at: now,
        released_at: None,
        assigned_by: actor,
        release_reason: None,
    };
    tables
        .bed_assignments
        .insert(assignment.id, assignment.clone());

    record_bed_transition(
        tables,
        bed_id,
        BedStatus::Occupied,
        actor,
        &format!("assigned to admission {admission_number}"),
        Some(*admission_id),
        Some(assignment.id),
        now,
    )?;

    Ok(assignment)
}

/// Close the admission's open binding and send its bed to cleaning.
///
/// Returns `None` when the admission holds no bed, which is not an error for
/// lifecycle callers (an admission may be finalised without ever having been
/// placed).
pub(crate) fn release_bed_in(
    tables: &mut Tables,
    admission_id: &RecordId,
    actor: RecordId,
    reason: &str,
    now: DateTime<Utc>,
) -> WardResult<Option<BedAssignment>> {
    tables.admission(admission_id)?;

    let released = match tables.open_assignment_for_admission_mut(admission_id) {
        Some(open) => {
            open.released_at = Some(now);
            open.release_reason = Some(reason.to_string());
            open.clone()
        }
        None => return Ok(None),
    };

    record_bed_transition(
        tables,
        &released.bed_id,
        BedStatus::Cleaning,
        actor,
        reason,
        Some(*admission_id),
        Some(released.id),
        now,
    )?;

    Ok(Some(released))
}

/// Allocation operations over the shared store.
#[derive(Clone)]
pub struct AllocationService {
    store: WardStore,
}

impl AllocationService {
    pub fn new(store: WardStore) -> Self {
        Self { store }
    }

    /// Initial bed placement for an active admission.
    pub fn assign_bed(
        &self,
        admission_id: &RecordId,
        bed_id: &RecordId,
        actor: RecordId,
    ) -> WardResult<BedAssignment> {
        let (admission_id, bed_id) = (*admission_id, *bed_id);
        run_contended(|| {
            self.store.transaction(|t| {
                assign_bed_in(t, &admission_id, &bed_id, actor, None, Utc::now())
            })
        })
    }

    /// Move an admission to a different bed.
    ///
    /// Requires an existing open assignment; the previous binding is closed
    /// with `reason` and its bed goes to cleaning.
    pub fn transfer_bed(
        &self,
        admission_id: &RecordId,
        new_bed_id: &RecordId,
        actor: RecordId,
        reason: NonEmptyText,
    ) -> WardResult<BedAssignment> {
        let (admission_id, new_bed_id) = (*admission_id, *new_bed_id);
        run_contended(|| {
            self.store.transaction(|t| {
                if t.open_assignment_for_admission(&admission_id).is_none() {
                    return Err(WardError::NotFound {
                        entity: "open bed assignment",
                        id: admission_id.to_string(),
                    });
                }
                assign_bed_in(
                    t,
                    &admission_id,
                    &new_bed_id,
                    actor,
                    Some(reason.as_str()),
                    Utc::now(),
                )
            })
        })
    }

    /// Explicitly release an admission's bed.
    pub fn release_bed(
        &self,
        admission_id: &RecordId,
        actor: RecordId,
        reason: NonEmptyText,
    ) -> WardResult<BedAssignment> {
        let admission_id = *admission_id;
        run_contended(|| {
            self.store.transaction(|t| {
                release_bed_in(t, &admission_id, actor, reason.as_str(), Utc::now())?.ok_or(
                    WardError::NotFound {
                        entity: "open bed assignment",
                        id: admission_id.to_string(),
                    },
                )
            })
        })
    }

    /// The bed currently serving an admission, if any. No side effects.
    pub fn current_bed(&self, admission_id: &RecordId) -> WardResult<Option<Bed>> {
        let admission_id = *admission_id;
        self.store.read(move |t| {
            t.admission(&admission_id)?;
            match t.open_assignment_for_admission(&admission_id) {
                Some(assignment) => Ok(Some(t.bed(&assignment.bed_id)?.clone())),
                None => Ok(None),
            }
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AdmissionSource, AdmissionType, BedType, NewBed, NewRoom, RoomType,
    };
    use crate::registry::RegistryService;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    struct Fixture {
        store: WardStore,
        allocation: AllocationService,
        registry: RegistryService,
    }

    fn fixture() -> Fixture {
        let store = WardStore::in_memory();
        Fixture {
            allocation: AllocationService::new(store.clone()),
            registry: RegistryService::new(store.clone()),
            store,
        }
    }

    impl Fixture {
        fn make_bed(&self, room_number: &str, bed_number: &str) -> Bed {
            let room = self
                .registry
                .create_room(NewRoom {
                    room_number: text(room_number),
                    room_type: RoomType::Ward,
                    floor: 1,
                    department: text("general-medicine"),
                    bed_capacity: 4,
                })
                .unwrap();
            self.registry
                .create_bed(
                    &room.id,
                    NewBed {
                        bed_number: text(bed_number),
                        bed_type: BedType::Standard,
                        capabilities: vec![],
                    },
                )
                .unwrap()
        }

        fn make_admission(&self, status: AdmissionStatus) -> Admission {
            let admission = Admission {
                id: RecordId::new(),
                admission_number: format!("ADM-2026-{:06}", 1),
                patient_id: RecordId::new(),
                attending_doctor_id: RecordId::new(),
                originating_appointment_id: None,
                admission_type: AdmissionType::Emergency,
                source: AdmissionSource::EmergencyRoom,
                admitting_diagnosis: text("community acquired pneumonia"),
                status,
                admitted_at: Utc::now(),
                expected_discharge_date: None,
                discharge_date: None,
                discharge_type: None,
                discharge_summary: None,
                condition_on_discharge: None,
                follow_up_instructions: None,
                length_of_stay_days: None,
            };
            let stored = admission.clone();
            self.store
                .transaction(move |t| {
                    t.admissions.insert(stored.id, stored.clone());
                    Ok(())
                })
                .unwrap();
            admission
        }
    }

    #[test]
    fn assign_marks_bed_occupied_and_opens_assignment() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let admission = fx.make_admission(AdmissionStatus::Active);
        let actor = RecordId::new();

        let assignment = fx.allocation.assign_bed(&admission.id, &bed.id, actor).unwrap();
        assert!(assignment.is_open());
        assert_eq!(assignment.bed_id, bed.id);

        let current = fx.allocation.current_bed(&admission.id).unwrap().unwrap();
        assert_eq!(current.id, bed.id);
        assert_eq!(current.status, BedStatus::Occupied);

        let history = fx.registry.bed_history(&bed.id, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, BedStatus::Available);
        assert_eq!(history[0].new_status, BedStatus::Occupied);
        assert_eq!(history[0].related_assignment_id, Some(assignment.id));
    }

    #[test]
    fn assign_rejects_occupied_bed() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let first = fx.make_admission(AdmissionStatus::Active);
        let second = fx.make_admission(AdmissionStatus::Active);
        let actor = RecordId::new();

        fx.allocation.assign_bed(&first.id, &bed.id, actor).unwrap();
        let err = fx
            .allocation
            .assign_bed(&second.id, &bed.id, actor)
            .unwrap_err();
        assert!(matches!(err, WardError::BedUnavailable { .. }));
    }

    #[test]
    fn assign_rejects_non_active_admission() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let admission = fx.make_admission(AdmissionStatus::PendingDischarge);

        let err = fx
            .allocation
            .assign_bed(&admission.id, &bed.id, RecordId::new())
            .unwrap_err();
        assert!(matches!(err, WardError::InvalidStateTransition { .. }));
    }

    #[test]
    fn transfer_closes_old_binding_and_cleans_old_bed() {
        let fx = fixture();
        let first_bed = fx.make_bed("1-101", "A");
        let second_bed = fx.make_bed("1-102", "A");
        let admission = fx.make_admission(AdmissionStatus::Active);
        let actor = RecordId::new();

        let initial = fx
            .allocation
            .assign_bed(&admission.id, &first_bed.id, actor)
            .unwrap();
        let transferred = fx
            .allocation
            .transfer_bed(&admission.id, &second_bed.id, actor, text("closer to monitoring"))
            .unwrap();

        // One open assignment for the admission, pointing at the new bed.
        let open = fx
            .store
            .read(|t| {
                t.bed_assignments
                    .values()
                    .filter(|a| a.is_open())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, transferred.id);
        assert_eq!(open[0].bed_id, second_bed.id);

        let closed = fx
            .store
            .read(|t| t.bed_assignments.get(&initial.id).cloned())
            .unwrap()
            .unwrap();
        assert!(!closed.is_open());
        assert_eq!(
            closed.release_reason.as_deref(),
            Some("closer to monitoring")
        );

        assert_eq!(
            fx.registry.bed(&first_bed.id).unwrap().status,
            BedStatus::Cleaning
        );
        assert_eq!(
            fx.registry.bed(&second_bed.id).unwrap().status,
            BedStatus::Occupied
        );
    }

    #[test]
    fn transfer_without_current_bed_is_not_found() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let admission = fx.make_admission(AdmissionStatus::Active);

        let err = fx
            .allocation
            .transfer_bed(&admission.id, &bed.id, RecordId::new(), text("move"))
            .unwrap_err();
        assert!(matches!(err, WardError::NotFound { .. }));
    }

    #[test]
    fn release_closes_binding_and_cleans_bed() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let admission = fx.make_admission(AdmissionStatus::Active);
        let actor = RecordId::new();

        fx.allocation.assign_bed(&admission.id, &bed.id, actor).unwrap();
        let released = fx
            .allocation
            .release_bed(&admission.id, actor, text("discharged home"))
            .unwrap();

        assert!(!released.is_open());
        assert_eq!(fx.registry.bed(&bed.id).unwrap().status, BedStatus::Cleaning);
        assert!(fx.allocation.current_bed(&admission.id).unwrap().is_none());

        let history = fx.registry.bed_history(&bed.id, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_status, BedStatus::Occupied);
        assert_eq!(history[0].new_status, BedStatus::Cleaning);
    }

    #[test]
    fn concurrent_assigns_to_one_bed_have_exactly_one_winner() {
        let fx = fixture();
        let bed = fx.make_bed("1-101", "A");
        let first = fx.make_admission(AdmissionStatus::Active);
        let second = fx.make_admission(AdmissionStatus::Active);

        let mut handles = Vec::new();
        for admission_id in [first.id, second.id] {
            let allocation = fx.allocation.clone();
            let bed_id = bed.id;
            handles.push(std::thread::spawn(move || {
                allocation.assign_bed(&admission_id, &bed_id, RecordId::new())
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        let losers = results
            .iter()
            .filter(|r| matches!(r, Err(WardError::BedUnavailable { .. })))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, 1);

        // Exactly one open assignment for the bed.
        let open = fx
            .store
            .read(|t| {
                t.bed_assignments
                    .values()
                    .filter(|a| a.is_open() && a.bed_id == bed.id)
                    .count()
            })
            .unwrap();
        assert_eq!(open, 1);
    }
}
