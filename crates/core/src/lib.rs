//! # Wardline Core
//!
//! Core business logic for the wardline inpatient admission and bed
//! management system.
//!
//! This crate contains the domain model and transactional services:
//! - Rooms, beds, and the bed status audit trail ([`registry`])
//! - The allocation ledger binding admissions to beds ([`allocation`])
//! - The admission lifecycle state machine ([`admissions`])
//! - Collision-free identifier issuance ([`sequence`])
//! - Best-effort discharge sync via a transactional outbox ([`sync`])
//!
//! All state lives in the [`store::WardStore`], whose transactions are the
//! unit-of-work boundary for every operation above.
//!
//! **No API concerns**: HTTP servers, OpenAPI documents, and CLI parsing
//! belong in `api-rest` and `wardline-cli`.

pub mod admissions;
pub mod allocation;
pub mod config;
pub mod constants;
pub mod error;
pub mod id;
pub mod model;
pub mod registry;
mod retry;
pub mod sequence;
pub mod store;
pub mod sync;

pub use admissions::{los_days, AdmissionsService};
pub use allocation::AllocationService;
pub use config::CoreConfig;
pub use error::{WardError, WardResult};
pub use id::RecordId;
pub use registry::{BedFilter, RegistryService};
pub use sequence::SequenceService;
pub use store::WardStore;
pub use sync::{drain_outbox, DischargeSync, LoggingDischargeSync, OutboxDrainReport, SyncError};

/// Convenience bundle of every core service over one shared store.
///
/// Binaries construct this once at startup and hand clones to their
/// handlers; all clones observe the same underlying tables.
#[derive(Clone)]
pub struct WardServices {
    pub admissions: AdmissionsService,
    pub allocation: AllocationService,
    pub registry: RegistryService,
    pub sequences: SequenceService,
    pub store: WardStore,
}

impl WardServices {
    /// Open the store described by `cfg` and wire every service to it.
    pub fn open(cfg: &CoreConfig) -> WardResult<Self> {
        let store = WardStore::open(cfg)?;
        Ok(Self::over(store))
    }

    /// Wire services over an already-open store.
    pub fn over(store: WardStore) -> Self {
        Self {
            admissions: AdmissionsService::new(store.clone()),
            allocation: AllocationService::new(store.clone()),
            registry: RegistryService::new(store.clone()),
            sequences: SequenceService::new(store.clone()),
            store,
        }
    }
}
