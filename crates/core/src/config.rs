//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core
//! services. Environment variables are read only in binaries, never during
//! request handling, which keeps behaviour consistent across multi-threaded
//! runtimes and test harnesses.

use crate::constants::{DEFAULT_WRITER_DEADLINE, SNAPSHOT_FILENAME};
use crate::error::{WardError, WardResult};
use crate::model::SequenceSpec;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wardline_types::{NonEmptyText, SequenceKey};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Snapshot directory. `None` keeps the store purely in memory.
    data_dir: Option<PathBuf>,
    /// Facility code embedded in operational logs, e.g. `stmarys-east`.
    facility: NonEmptyText,
    writer_deadline: Duration,
    sequences: Vec<SequenceSpec>,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the default sequence families.
    pub fn new(data_dir: Option<PathBuf>, facility: NonEmptyText) -> WardResult<Self> {
        Ok(Self {
            data_dir,
            facility,
            writer_deadline: DEFAULT_WRITER_DEADLINE,
            sequences: default_sequences()?,
        })
    }

    /// Override the writer deadline (mainly for tests exercising contention).
    pub fn with_writer_deadline(mut self, deadline: Duration) -> Self {
        self.writer_deadline = deadline;
        self
    }

    /// Register an additional sequence family to be seeded at store open.
    pub fn with_sequence(mut self, spec: SequenceSpec) -> Self {
        self.sequences.push(spec);
        self
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Full path of the snapshot file, when persistence is configured.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join(SNAPSHOT_FILENAME))
    }

    pub fn facility(&self) -> &NonEmptyText {
        &self.facility
    }

    pub fn writer_deadline(&self) -> Duration {
        self.writer_deadline
    }

    pub fn sequences(&self) -> &[SequenceSpec] {
        &self.sequences
    }
}

/// The sequence families every deployment carries.
///
/// Admission numbers restart each calendar year; MRNs never do.
fn default_sequences() -> WardResult<Vec<SequenceSpec>> {
    let admission = SequenceKey::new("admission")
        .map_err(|e| WardError::InvalidInput(e.to_string()))?;
    let mrn = SequenceKey::new("mrn").map_err(|e| WardError::InvalidInput(e.to_string()))?;

    Ok(vec![
        SequenceSpec::new(admission, "ADM", true),
        SequenceSpec::new(mrn, "MRN", false),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility() -> NonEmptyText {
        NonEmptyText::new("test-facility").unwrap()
    }

    #[test]
    fn default_config_seeds_admission_and_mrn() {
        let cfg = CoreConfig::new(None, facility()).unwrap();
        let keys: Vec<&str> = cfg.sequences().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["admission", "mrn"]);
    }

    #[test]
    fn snapshot_path_is_none_for_in_memory() {
        let cfg = CoreConfig::new(None, facility()).unwrap();
        assert!(cfg.snapshot_path().is_none());
    }

    #[test]
    fn snapshot_path_joins_data_dir() {
        let cfg = CoreConfig::new(Some(PathBuf::from("/tmp/ward")), facility()).unwrap();
        assert_eq!(
            cfg.snapshot_path().unwrap(),
            PathBuf::from("/tmp/ward/ward.json")
        );
    }
}
