//! Persisted data model for the admission and bed-allocation core.
//!
//! One file per table. Enum codes use `snake_case` on the wire and in the
//! store snapshot; `Display`/`FromStr` impls use the same spelling so URLs,
//! CLI arguments, and stored rows never disagree.

mod admission;
mod assignment;
mod bed;
mod outbox;
mod room;
mod sequence;
mod status_log;

pub use admission::{
    Admission, AdmissionSource, AdmissionStatus, AdmissionType, DischargeType, NewAdmission,
};
pub use assignment::BedAssignment;
pub use bed::{Bed, BedStatus, BedType, NewBed};
pub use outbox::{DischargeNotice, OutboxEvent};
pub use room::{NewRoom, Room, RoomType};
pub use sequence::{IdSequence, SequenceSpec};
pub use status_log::BedStatusLog;
