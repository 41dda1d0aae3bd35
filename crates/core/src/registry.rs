//! Bed and room registry.
//!
//! Read-heavy reference data plus the single write path for bed status.
//! There is deliberately no bare status setter: every status change goes
//! through [`record_bed_transition`], which mutates the bed and appends the
//! matching [`BedStatusLog`] row in the same unit of work. Staff actions are
//! validated against the staff transition table first; allocation-driven
//! transitions are performed by the allocation ledger, which calls
//! [`record_bed_transition`] directly.

use crate::error::{WardError, WardResult};
use crate::id::RecordId;
use crate::model::{
    Admission, Bed, BedAssignment, BedStatus, BedStatusLog, BedType, NewBed, NewRoom, Room,
};
use crate::store::{Tables, WardStore};
use chrono::{DateTime, Utc};
use wardline_types::NonEmptyText;

/// Query filter for bed listings. Empty filter matches every bed.
#[derive(Clone, Debug, Default)]
pub struct BedFilter {
    pub status: Option<BedStatus>,
    pub bed_type: Option<BedType>,
    pub department: Option<String>,
    pub floor: Option<i16>,
}

/// Apply a bed status change and append its audit row.
///
/// This is the only place in the crate that writes `Bed.status`. Callers are
/// responsible for having validated the transition (staff table or
/// allocation rules); this function still rejects no-op transitions so a
/// change with no audit row can never slip through.
pub(crate) fn record_bed_transition(
    tables: &mut Tables,
    bed_id: &RecordId,
    new_status: BedStatus,
    changed_by: RecordId,
    reason: &str,
    related_admission_id: Option<RecordId>,
    related_assignment_id: Option<RecordId>,
    now: DateTime<Utc>,
) -> WardResult<()> {
    let bed = tables.bed_mut(bed_id)?;
    let old_status = bed.status;
    if old_status == new_status {
        return Err(WardError::InvalidBedTransition {
            bed: bed_id.to_string(),
            from: old_status,
            to: new_status,
        });
    }

    bed.status = new_status;
    if old_status == BedStatus::Cleaning && new_status == BedStatus::Available {
        bed.last_cleaned_at = Some(now);
    }

    tables.bed_status_logs.push(BedStatusLog {
        id: RecordId::new(),
        bed_id: *bed_id,
        old_status,
        new_status,
        changed_by,
        reason: reason.to_string(),
        related_admission_id,
        related_assignment_id,
        changed_at: now,
    });

    Ok(())
}

/// Registry operations over the shared store.
#[derive(Clone)]
pub struct RegistryService {
    store: WardStore,
}

impl RegistryService {
    pub fn new(store: WardStore) -> Self {
        Self { store }
    }

    /// Create a room. Room numbers are unique facility-wide.
    pub fn create_room(&self, new: NewRoom) -> WardResult<Room> {
        self.store.transaction(move |t| {
            if new.bed_capacity == 0 {
                return Err(WardError::InvalidInput(
                    "room bed capacity must be at least 1".into(),
                ));
            }
            if t.room_number_exists(new.room_number.as_str()) {
                return Err(WardError::Conflict(format!(
                    "room number '{}' already exists",
                    new.room_number
                )));
            }

            let room = Room {
                id: RecordId::new(),
                room_number: new.room_number,
                room_type: new.room_type,
                floor: new.floor,
                department: new.department,
                bed_capacity: new.bed_capacity,
                operational: true,
                created_at: Utc::now(),
            };
            t.rooms.insert(room.id, room.clone());
            Ok(room)
        })
    }

    /// Flip a room's operational flag. Non-operational rooms accept no new
    /// allocations; existing occupants are unaffected.
    pub fn set_room_operational(&self, room_id: &RecordId, operational: bool) -> WardResult<Room> {
        let room_id = *room_id;
        self.store.transaction(move |t| {
            let room = t.room_mut(&room_id)?;
            room.operational = operational;
            Ok(room.clone())
        })
    }

    pub fn room(&self, room_id: &RecordId) -> WardResult<Room> {
        let room_id = *room_id;
        self.store.read(|t| t.room(&room_id).cloned())?
    }

    pub fn list_rooms(&self) -> WardResult<Vec<Room>> {
        self.store.read(|t| t.rooms.values().cloned().collect())
    }

    /// Add a bed to a room. Bed numbers are unique within their room and the
    /// room's capacity bounds how many beds it may hold.
    pub fn create_bed(&self, room_id: &RecordId, new: NewBed) -> WardResult<Bed> {
        let room_id = *room_id;
        self.store.transaction(move |t| {
            let room = t.room(&room_id)?;
            let capacity = usize::from(room.bed_capacity);
            if t.bed_count_in_room(&room_id) >= capacity {
                return Err(WardError::Conflict(format!(
                    "room '{}' is at its bed capacity of {capacity}",
                    room.room_number
                )));
            }
            if t.bed_number_exists_in_room(&room_id, new.bed_number.as_str()) {
                return Err(WardError::Conflict(format!(
                    "bed '{}' already exists in room '{}'",
                    new.bed_number, room.room_number
                )));
            }

            let bed = Bed {
                id: RecordId::new(),
                room_id,
                bed_number: new.bed_number,
                bed_type: new.bed_type,
                status: BedStatus::Available,
                capabilities: new.capabilities,
                last_cleaned_at: None,
                created_at: Utc::now(),
            };
            t.beds.insert(bed.id, bed.clone());
            Ok(bed)
        })
    }

    pub fn bed(&self, bed_id: &RecordId) -> WardResult<Bed> {
        let bed_id = *bed_id;
        self.store.read(|t| t.bed(&bed_id).cloned())?
    }

    /// List beds matching `filter`.
    ///
    /// When filtering for `Available`, beds in non-operational rooms are
    /// excluded: they cannot be allocated, so offering them to allocation
    /// callers would only produce `BedUnavailable` churn.
    pub fn list_beds(&self, filter: &BedFilter) -> WardResult<Vec<Bed>> {
        let filter = filter.clone();
        self.store.read(move |t| {
            t.beds
                .values()
                .filter(|bed| {
                    if let Some(status) = filter.status {
                        if bed.status != status {
                            return false;
                        }
                    }
                    if let Some(bed_type) = filter.bed_type {
                        if bed.bed_type != bed_type {
                            return false;
                        }
                    }
                    let room = match t.rooms.get(&bed.room_id) {
                        Some(room) => room,
                        None => return false,
                    };
                    if filter.status == Some(BedStatus::Available) && !room.operational {
                        return false;
                    }
                    if let Some(department) = &filter.department {
                        if room.department.as_str() != department {
                            return false;
                        }
                    }
                    if let Some(floor) = filter.floor {
                        if room.floor != floor {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect()
        })
    }

    /// The admission currently occupying a bed, joined through the ledger.
    pub fn occupant(&self, bed_id: &RecordId) -> WardResult<Option<(Admission, BedAssignment)>> {
        let bed_id = *bed_id;
        self.store.read(move |t| {
            t.bed(&bed_id)?;
            match t.open_assignment_for_bed(&bed_id) {
                Some(assignment) => {
                    let admission = t.admission(&assignment.admission_id)?;
                    Ok(Some((admission.clone(), assignment.clone())))
                }
                None => Ok(None),
            }
        })?
    }

    /// Audit history for a bed, newest first.
    pub fn bed_history(&self, bed_id: &RecordId, limit: usize) -> WardResult<Vec<BedStatusLog>> {
        let bed_id = *bed_id;
        self.store.read(move |t| {
            t.bed(&bed_id)?;
            let mut rows: Vec<BedStatusLog> = t
                .bed_status_logs
                .iter()
                .filter(|row| row.bed_id == bed_id)
                .cloned()
                .collect();
            rows.reverse();
            rows.truncate(limit);
            Ok(rows)
        })?
    }

    /// Explicit staff-driven status change (reserve, clean, maintenance).
    ///
    /// Allocation-only transitions are rejected here; they happen through
    /// the allocation ledger. Entering maintenance while the bed still has an
    /// open assignment is accepted but logged as a conflict for follow-up.
    pub fn transition_bed_status(
        &self,
        bed_id: &RecordId,
        new_status: BedStatus,
        actor: RecordId,
        reason: NonEmptyText,
        related_admission_id: Option<RecordId>,
    ) -> WardResult<Bed> {
        let bed_id = *bed_id;
        self.store.transaction(move |t| {
            let bed = t.bed(&bed_id)?;
            let from = bed.status;
            if !from.staff_change_allowed(new_status) {
                return Err(WardError::InvalidBedTransition {
                    bed: bed_id.to_string(),
                    from,
                    to: new_status,
                });
            }

            let open = t.open_assignment_for_bed(&bed_id);
            if new_status == BedStatus::Maintenance {
                if let Some(assignment) = open {
                    tracing::warn!(
                        bed = %bed_id,
                        admission = %assignment.admission_id,
                        "bed taken into maintenance while an open assignment exists"
                    );
                }
            }
            let related_assignment_id = open.map(|a| a.id);

            record_bed_transition(
                t,
                &bed_id,
                new_status,
                actor,
                reason.as_str(),
                related_admission_id,
                related_assignment_id,
                Utc::now(),
            )?;
            Ok(t.bed(&bed_id)?.clone())
        })
    }
}
