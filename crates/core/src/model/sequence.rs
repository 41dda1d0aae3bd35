//! Identifier sequence rows.

use serde::{Deserialize, Serialize};
use wardline_types::SequenceKey;

/// Default zero-padded width for formatted sequence values.
pub const DEFAULT_SEQUENCE_WIDTH: u8 = 6;

/// One named counter family, e.g. admission numbers or MRNs.
///
/// Issued values are strictly increasing per `(key, year)`. Gaps caused by
/// rolled-back units of work are acceptable; duplicates are not.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdSequence {
    pub key: SequenceKey,
    /// Uppercase short code prepended to every issued value, e.g. `ADM`.
    pub prefix: String,
    /// Zero-padded width of the numeric part.
    pub width: u8,
    /// Last issued numeric value (0 when nothing issued yet).
    pub current_value: u64,
    /// Calendar year the current value applies to.
    pub year: i32,
    /// Whether the counter restarts at 1 each calendar year.
    pub reset_yearly: bool,
}

/// Registration input for a sequence family.
#[derive(Clone, Debug)]
pub struct SequenceSpec {
    pub key: SequenceKey,
    pub prefix: String,
    pub width: u8,
    pub reset_yearly: bool,
}

impl SequenceSpec {
    pub fn new(key: SequenceKey, prefix: impl Into<String>, reset_yearly: bool) -> Self {
        Self {
            key,
            prefix: prefix.into(),
            width: DEFAULT_SEQUENCE_WIDTH,
            reset_yearly,
        }
    }

    pub fn with_width(mut self, width: u8) -> Self {
        self.width = width;
        self
    }
}
