//! The ward store: the sole serialization point for all admission and bed
//! state.
//!
//! Every logical operation (assign, transfer, release, lifecycle transition,
//! sequence issuance) runs as one *unit of work* via [`WardStore::transaction`]:
//! the store takes its exclusive writer, clones the table set, applies the
//! operation to the clone, and commits by swapping the clone in, after
//! durably writing the snapshot when persistence is configured. An error
//! anywhere inside the unit of work discards the clone, so partial writes are
//! never observable, not even to readers racing the writer.
//!
//! Writer acquisition is bounded: the store polls with exponential backoff up
//! to a configured deadline and then aborts the unit of work with
//! `ConcurrentUpdate`, which callers may retry a bounded number of times.
//!
//! Persistence is a single JSON snapshot written atomically (temp file +
//! rename in the same directory). In-memory stores (tests, ephemeral tooling)
//! simply skip the snapshot step.

use crate::config::CoreConfig;
use crate::error::{WardError, WardResult};
use crate::id::RecordId;
use crate::model::{Admission, Bed, BedAssignment, BedStatusLog, IdSequence, OutboxEvent, Room};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use wardline_types::SequenceKey;

/// The full logical table set.
///
/// `bed_status_logs` is append-only; everything else is keyed by [`RecordId`]
/// (or [`SequenceKey`] for counter families).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub rooms: BTreeMap<RecordId, Room>,
    pub beds: BTreeMap<RecordId, Bed>,
    pub admissions: BTreeMap<RecordId, Admission>,
    pub bed_assignments: BTreeMap<RecordId, BedAssignment>,
    pub bed_status_logs: Vec<BedStatusLog>,
    pub id_sequences: BTreeMap<SequenceKey, IdSequence>,
    pub outbox: BTreeMap<RecordId, OutboxEvent>,
}

impl Tables {
    pub fn room(&self, id: &RecordId) -> WardResult<&Room> {
        self.rooms.get(id).ok_or(WardError::NotFound {
            entity: "room",
            id: id.to_string(),
        })
    }

    pub fn room_mut(&mut self, id: &RecordId) -> WardResult<&mut Room> {
        self.rooms.get_mut(id).ok_or(WardError::NotFound {
            entity: "room",
            id: id.to_string(),
        })
    }

    pub fn bed(&self, id: &RecordId) -> WardResult<&Bed> {
        self.beds.get(id).ok_or(WardError::NotFound {
            entity: "bed",
            id: id.to_string(),
        })
    }

    pub fn bed_mut(&mut self, id: &RecordId) -> WardResult<&mut Bed> {
        self.beds.get_mut(id).ok_or(WardError::NotFound {
            entity: "bed",
            id: id.to_string(),
        })
    }

    pub fn admission(&self, id: &RecordId) -> WardResult<&Admission> {
        self.admissions.get(id).ok_or(WardError::NotFound {
            entity: "admission",
            id: id.to_string(),
        })
    }

    pub fn admission_mut(&mut self, id: &RecordId) -> WardResult<&mut Admission> {
        self.admissions.get_mut(id).ok_or(WardError::NotFound {
            entity: "admission",
            id: id.to_string(),
        })
    }

    /// The admission's current binding, if any (invariant: at most one).
    pub fn open_assignment_for_admission(&self, admission_id: &RecordId) -> Option<&BedAssignment> {
        self.bed_assignments
            .values()
            .find(|a| a.is_open() && a.admission_id == *admission_id)
    }

    pub fn open_assignment_for_admission_mut(
        &mut self,
        admission_id: &RecordId,
    ) -> Option<&mut BedAssignment> {
        self.bed_assignments
            .values_mut()
            .find(|a| a.is_open() && a.admission_id == *admission_id)
    }

    /// The bed's current occupant binding, if any (invariant: at most one).
    pub fn open_assignment_for_bed(&self, bed_id: &RecordId) -> Option<&BedAssignment> {
        self.bed_assignments
            .values()
            .find(|a| a.is_open() && a.bed_id == *bed_id)
    }

    pub fn room_number_exists(&self, room_number: &str) -> bool {
        self.rooms
            .values()
            .any(|r| r.room_number.as_str() == room_number)
    }

    pub fn bed_number_exists_in_room(&self, room_id: &RecordId, bed_number: &str) -> bool {
        self.beds
            .values()
            .any(|b| b.room_id == *room_id && b.bed_number.as_str() == bed_number)
    }

    pub fn bed_count_in_room(&self, room_id: &RecordId) -> usize {
        self.beds.values().filter(|b| b.room_id == *room_id).count()
    }
}

#[derive(Debug)]
struct StoreInner {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
    writer_deadline: Duration,
}

/// Handle to the shared store. Cheap to clone; all clones see the same data.
#[derive(Clone, Debug)]
pub struct WardStore {
    inner: Arc<StoreInner>,
}

impl WardStore {
    /// A purely in-memory store with the default writer deadline.
    ///
    /// Used by tests and short-lived tooling; no snapshot is ever written.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tables: RwLock::new(Tables::default()),
                snapshot_path: None,
                writer_deadline: crate::constants::DEFAULT_WRITER_DEADLINE,
            }),
        }
    }

    /// Open the store described by `cfg`.
    ///
    /// Creates the data directory if needed, loads the snapshot when one
    /// exists, and seeds any configured sequence families that are not yet
    /// present.
    pub fn open(cfg: &CoreConfig) -> WardResult<Self> {
        if let Some(dir) = cfg.data_dir() {
            std::fs::create_dir_all(dir).map_err(WardError::DataDirCreation)?;
        }

        let snapshot_path = cfg.snapshot_path();
        let tables = match &snapshot_path {
            Some(path) if path.is_file() => {
                let bytes = std::fs::read(path).map_err(WardError::SnapshotRead)?;
                serde_json::from_slice(&bytes).map_err(WardError::SnapshotDeserialisation)?
            }
            _ => Tables::default(),
        };

        let store = Self {
            inner: Arc::new(StoreInner {
                tables: RwLock::new(tables),
                snapshot_path,
                writer_deadline: cfg.writer_deadline(),
            }),
        };

        let specs = cfg.sequences().to_vec();
        store.transaction(|t| {
            crate::sequence::seed_in(t, &specs, Utc::now());
            Ok(())
        })?;

        Ok(store)
    }

    /// Run a read-only query against a consistent view of the tables.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> WardResult<T> {
        let guard = self.acquire_read()?;
        Ok(f(&guard))
    }

    /// Run `f` as one unit of work.
    ///
    /// `f` receives a private clone of the tables. On `Ok` the clone is
    /// durably snapshotted (when configured) and swapped in; on `Err` it is
    /// dropped and the store is untouched.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> WardResult<T>) -> WardResult<T> {
        let mut guard = self.acquire_write()?;
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        if let Some(path) = &self.inner.snapshot_path {
            persist_snapshot(path, &staged)?;
        }
        *guard = staged;
        Ok(out)
    }

    fn acquire_read(&self) -> WardResult<RwLockReadGuard<'_, Tables>> {
        let deadline = Instant::now() + self.inner.writer_deadline;
        let mut backoff = Duration::from_micros(50);
        loop {
            match self.inner.tables.try_read() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(WardError::ConcurrentUpdate);
                    }
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(Duration::from_millis(10));
                }
            }
        }
    }

    fn acquire_write(&self) -> WardResult<RwLockWriteGuard<'_, Tables>> {
        let deadline = Instant::now() + self.inner.writer_deadline;
        let mut backoff = Duration::from_micros(50);
        loop {
            match self.inner.tables.try_write() {
                Ok(guard) => return Ok(guard),
                // A poisoned lock means a previous writer panicked between
                // acquiring the guard and the final swap; the tables
                // themselves were never left half-written.
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(WardError::ConcurrentUpdate);
                    }
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(Duration::from_millis(10));
                }
            }
        }
    }
}

/// Write the snapshot atomically: temp file in the same directory, fsync,
/// then rename over the target.
fn persist_snapshot(path: &Path, tables: &Tables) -> WardResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let bytes = serde_json::to_vec_pretty(tables).map_err(WardError::SnapshotSerialisation)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(WardError::SnapshotWrite)?;
    tmp.write_all(&bytes).map_err(WardError::SnapshotWrite)?;
    tmp.as_file().sync_all().map_err(WardError::SnapshotWrite)?;
    tmp.persist(path)
        .map_err(|e| WardError::SnapshotWrite(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewRoom, RoomType};
    use wardline_types::NonEmptyText;

    fn sample_room() -> Room {
        let spec = NewRoom {
            room_number: NonEmptyText::new("1-101").unwrap(),
            room_type: RoomType::Ward,
            floor: 1,
            department: NonEmptyText::new("general-medicine").unwrap(),
            bed_capacity: 4,
        };
        Room {
            id: RecordId::new(),
            room_number: spec.room_number,
            room_type: spec.room_type,
            floor: spec.floor,
            department: spec.department,
            bed_capacity: spec.bed_capacity,
            operational: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn failed_unit_of_work_leaves_no_trace() {
        let store = WardStore::in_memory();
        let err = store
            .transaction(|t| {
                let room = sample_room();
                t.rooms.insert(room.id, room);
                Err::<(), _>(WardError::InvalidInput("abort".into()))
            })
            .unwrap_err();
        assert!(matches!(err, WardError::InvalidInput(_)));

        let count = store.read(|t| t.rooms.len()).unwrap();
        assert_eq!(count, 0, "rolled-back insert must not be visible");
    }

    #[test]
    fn committed_unit_of_work_is_visible() {
        let store = WardStore::in_memory();
        let id = store
            .transaction(|t| {
                let room = sample_room();
                let id = room.id;
                t.rooms.insert(id, room);
                Ok(id)
            })
            .unwrap();

        let found = store.read(|t| t.rooms.contains_key(&id)).unwrap();
        assert!(found);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            Some(dir.path().to_path_buf()),
            NonEmptyText::new("test").unwrap(),
        )
        .unwrap();

        let id = {
            let store = WardStore::open(&cfg).unwrap();
            store
                .transaction(|t| {
                    let room = sample_room();
                    let id = room.id;
                    t.rooms.insert(id, room);
                    Ok(id)
                })
                .unwrap()
        };

        let reopened = WardStore::open(&cfg).unwrap();
        let found = reopened.read(|t| t.rooms.contains_key(&id)).unwrap();
        assert!(found, "snapshot should round-trip across open()");
    }

    #[test]
    fn open_seeds_default_sequences() {
        let store = WardStore::open(
            &CoreConfig::new(None, NonEmptyText::new("test").unwrap()).unwrap(),
        )
        .unwrap();
        let keys: Vec<String> = store
            .read(|t| t.id_sequences.keys().map(|k| k.to_string()).collect())
            .unwrap();
        assert!(keys.contains(&"admission".to_string()));
        assert!(keys.contains(&"mrn".to_string()));
    }

    #[test]
    fn concurrent_writers_serialise() {
        let store = WardStore::in_memory();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store
                    .transaction(|t| {
                        let room = sample_room();
                        // room_number collides across threads, but ids differ;
                        // this test only checks writer serialisation.
                        t.rooms.insert(room.id, room);
                        Ok(())
                    })
                    .unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.read(|t| t.rooms.len()).unwrap(), 8);
    }
}
