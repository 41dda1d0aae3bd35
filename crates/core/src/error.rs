//! Error taxonomy for the wardline core.
//!
//! Every service operation returns [`WardResult`]. All variants except the
//! snapshot wrappers are caller-correctable: the message carries enough
//! context to retry with different input (for example, which bed was
//! unavailable and what state it was actually in).

use crate::model::{AdmissionStatus, BedStatus};

#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("admission {id} is {from}; cannot {attempted}")]
    InvalidStateTransition {
        id: String,
        from: AdmissionStatus,
        attempted: String,
    },

    #[error("bed {bed} is not available (currently {status})")]
    BedUnavailable { bed: String, status: BedStatus },

    #[error("bed {bed} cannot move from {from} to {to} by staff action")]
    InvalidBedTransition {
        bed: String,
        from: BedStatus,
        to: BedStatus,
    },

    #[error("actor {actor} is not permitted to {action}")]
    AccessDenied { actor: String, action: String },

    #[error("sequence {key} exhausted: next value no longer fits width {width}")]
    SequenceExhausted { key: String, width: u8 },

    #[error("timed out waiting for exclusive access to the ward store")]
    ConcurrentUpdate,

    #[error("failed to create ward data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to read store snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to write store snapshot: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("failed to serialise store snapshot: {0}")]
    SnapshotSerialisation(serde_json::Error),
    #[error("failed to deserialise store snapshot: {0}")]
    SnapshotDeserialisation(serde_json::Error),
}

pub type WardResult<T> = std::result::Result<T, WardError>;

impl WardError {
    /// True for contention errors worth a bounded retry before surfacing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WardError::ConcurrentUpdate)
    }
}
