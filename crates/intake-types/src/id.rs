//! Patient record identity.
//!
//! Identifiers minted by the intake form are canonical UUIDs: **32 lowercase hexadecimal
//! characters** (no hyphens), the same value as `Uuid::new_v4().simple().to_string()`.
//!
//! The dashboard must also accept identifiers produced by other publishers on the channel, so
//! parsing only requires a non-blank string.

use std::fmt;
use std::str::FromStr;

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("patient id cannot be empty")]
    Empty,
}

/// Opaque, stable identity of a patient record.
///
/// Two records are the same patient for roster purposes exactly when their ids are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientId(String);

impl PatientId {
    /// Mints a new canonical identifier for a fresh draft.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accepts any identifier that is not blank. The value is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for empty or whitespace-only input.
    pub fn parse(input: impl Into<String>) -> Result<Self, IdError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PatientId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

impl TryFrom<String> for PatientId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PatientId::parse(value)
    }
}

impl From<PatientId> for String {
    fn from(id: PatientId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical_and_distinct() {
        let a = PatientId::generate();
        let b = PatientId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert!(a
            .as_str()
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_keeps_foreign_ids_verbatim() {
        let id = PatientId::parse("p1").unwrap();
        assert_eq!(id.as_str(), "p1");
        let padded = PatientId::parse(" P-01 ").unwrap();
        assert_eq!(padded.as_str(), " P-01 ");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(matches!(PatientId::parse("  "), Err(IdError::Empty)));
        let result: Result<PatientId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
