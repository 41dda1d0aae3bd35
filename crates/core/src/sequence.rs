//! Atomic sequence issuer.
//!
//! Issues collision-free, human-readable identifiers of the form
//! `PREFIX-YYYY-NNNNNN`. Issuance always runs inside the caller's unit of
//! work, so a failure anywhere in the calling operation also rolls back the
//! counter increment: identifiers are never handed out speculatively, and
//! two concurrent callers can never observe the same pre-increment value.
//!
//! The yearly check-and-reset happens under the same exclusive access as the
//! increment; there is no window in which two callers both observe "needs
//! reset" and both restart at 1.

use crate::error::{WardError, WardResult};
use crate::model::{IdSequence, SequenceSpec};
use crate::store::{Tables, WardStore};
use chrono::{DateTime, Datelike, Utc};
use wardline_types::SequenceKey;

/// Widths above this cannot be represented in a `u64` counter.
const MAX_WIDTH: u8 = 12;

/// Insert any configured sequence families that are not present yet.
///
/// Existing families are left untouched, so re-opening a store never resets
/// live counters.
pub(crate) fn seed_in(tables: &mut Tables, specs: &[SequenceSpec], now: DateTime<Utc>) {
    for spec in specs {
        tables
            .id_sequences
            .entry(spec.key.clone())
            .or_insert_with(|| IdSequence {
                key: spec.key.clone(),
                prefix: spec.prefix.clone(),
                width: spec.width,
                current_value: 0,
                year: now.year(),
                reset_yearly: spec.reset_yearly,
            });
    }
}

/// Register a new sequence family explicitly.
pub(crate) fn register_in(
    tables: &mut Tables,
    spec: &SequenceSpec,
    now: DateTime<Utc>,
) -> WardResult<IdSequence> {
    if spec.width == 0 || spec.width > MAX_WIDTH {
        return Err(WardError::InvalidInput(format!(
            "sequence width must be between 1 and {MAX_WIDTH}, got {}",
            spec.width
        )));
    }
    if spec.prefix.is_empty() || !spec.prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(WardError::InvalidInput(
            "sequence prefix must be non-empty uppercase ASCII".into(),
        ));
    }
    if tables.id_sequences.contains_key(&spec.key) {
        return Err(WardError::Conflict(format!(
            "sequence '{}' already exists",
            spec.key
        )));
    }

    let seq = IdSequence {
        key: spec.key.clone(),
        prefix: spec.prefix.clone(),
        width: spec.width,
        current_value: 0,
        year: now.year(),
        reset_yearly: spec.reset_yearly,
    };
    tables.id_sequences.insert(spec.key.clone(), seq.clone());
    Ok(seq)
}

/// Issue the next formatted identifier for `key`.
///
/// Must be called inside a unit of work; the increment commits or rolls back
/// with everything else the caller does.
pub(crate) fn next_value_in(
    tables: &mut Tables,
    key: &SequenceKey,
    now: DateTime<Utc>,
) -> WardResult<String> {
    let seq = tables
        .id_sequences
        .get_mut(key)
        .ok_or(WardError::NotFound {
            entity: "sequence",
            id: key.to_string(),
        })?;

    let current_year = now.year();
    if seq.year < current_year {
        // Non-resetting families advance the year label only; the counter
        // keeps increasing so values stay unique across years.
        if seq.reset_yearly {
            seq.current_value = 0;
        }
        seq.year = current_year;
    }

    let max = 10u64.pow(u32::from(seq.width.min(MAX_WIDTH))) - 1;
    let next = seq.current_value + 1;
    if next > max {
        return Err(WardError::SequenceExhausted {
            key: key.to_string(),
            width: seq.width,
        });
    }

    seq.current_value = next;
    Ok(format_id(&seq.prefix, seq.year, next, seq.width))
}

fn format_id(prefix: &str, year: i32, value: u64, width: u8) -> String {
    format!("{prefix}-{year}-{value:0width$}", width = width as usize)
}

/// Public issuance API over the shared store.
#[derive(Clone)]
pub struct SequenceService {
    store: WardStore,
}

impl SequenceService {
    pub fn new(store: WardStore) -> Self {
        Self { store }
    }

    /// Issue the next identifier for `key` in its own unit of work.
    pub fn next_value(&self, key: &SequenceKey) -> WardResult<String> {
        let key = key.clone();
        self.store
            .transaction(move |t| next_value_in(t, &key, Utc::now()))
    }

    /// Register a new sequence family.
    pub fn register(&self, spec: SequenceSpec) -> WardResult<IdSequence> {
        self.store
            .transaction(move |t| register_in(t, &spec, Utc::now()))
    }

    /// Current state of a sequence family, if registered.
    pub fn get(&self, key: &SequenceKey) -> WardResult<IdSequence> {
        let key = key.clone();
        self.store.read(|t| t.id_sequences.get(&key).cloned())?.ok_or(
            WardError::NotFound {
                entity: "sequence",
                id: key.to_string(),
            },
        )
    }
}
