//! Record identifiers.
//!
//! Wardline keys every stored row by a *canonical* UUID representation:
//! **32 lowercase hexadecimal characters**, no hyphens. The wrapper type here
//! guarantees the canonical form once constructed, so map keys, snapshot
//! contents, and URL path segments all agree on one spelling.
//!
//! Canonical form:
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (API paths, CLI arguments) must already be
//! canonical; use [`RecordId::parse`] to validate them. Non-canonical values
//! (uppercase, hyphenated, wrong length) are rejected rather than normalised.

use crate::error::{WardError, WardResult};
use std::fmt;
use uuid::Uuid;

/// Canonical row identifier (32 lowercase hex characters).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocates a fresh identifier for a new row.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WardError::InvalidInput`] unless `input` is exactly 32
    /// lowercase hex characters.
    pub fn parse(input: &str) -> WardResult<Self> {
        if Self::is_canonical(input) {
            // is_canonical guarantees valid hex, so parse_str cannot fail
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(WardError::InvalidInput(format!(
            "identifier must be 32 lowercase hex characters without hyphens, got: '{input}'"
        )))
    }

    /// Purely syntactic canonical-form check.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0.simple())
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_canonical() {
        let id = RecordId::new();
        assert!(RecordId::is_canonical(&id.to_string()));
    }

    #[test]
    fn parse_round_trips() {
        let id = RecordId::new();
        let parsed = RecordId::parse(&id.to_string()).expect("canonical id should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_hyphenated_and_uppercase() {
        assert!(RecordId::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(RecordId::parse("not-an-id").is_err());
    }

    #[test]
    fn serde_uses_canonical_string() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
