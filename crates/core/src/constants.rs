//! Constants used throughout the wardline core crate.

use std::time::Duration;

/// Default directory for ward data storage when no explicit directory is configured.
pub const DEFAULT_WARD_DATA_DIR: &str = "ward_data";

/// Filename of the store snapshot inside the ward data directory.
pub const SNAPSHOT_FILENAME: &str = "ward.json";

/// How long a unit of work may wait for the store writer before aborting.
pub const DEFAULT_WRITER_DEADLINE: Duration = Duration::from_secs(2);

/// Bounded retry attempts for contended operations before surfacing an error.
pub const CONTENTION_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff between contention retries (doubled per attempt).
pub const CONTENTION_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Delivery attempts per outbox event before it is left for manual review.
pub const OUTBOX_MAX_ATTEMPTS: u32 = 5;
