//! Normalized identifiers
//!
//! Source payloads are inconsistent about identity: program ids arrive as
//! JSON numbers from the backend but as strings after a URL round trip, and
//! legacy tree payloads key nodes by a `value` field instead of
//! `program_id`. Both inconsistencies are resolved once, at ingestion, so
//! that every lookup downstream compares a single normalized type.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Normalized program identifier
///
/// Opaque, stable, unique within a tree. Deserializes from either a JSON
/// string or integer; always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProgramId(String);

impl ProgramId {
    /// Create id from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the normalized form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProgramId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProgramId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ProgramId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ProgramId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ProgramId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a program id as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ProgramId::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ProgramId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ProgramId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ProgramId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Stable software-effort identifier
///
/// Client-assignable content key; the server-assigned numeric `id` exists
/// separately on [`crate::SoftwareEffort`]. Parent references between
/// efforts always use this uuid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EffortUuid(pub Uuid);

impl EffortUuid {
    /// Generate a fresh uuid for a new effort
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffortUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffortUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EffortUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn program_id_from_json_number() {
        let id: ProgramId = serde_json::from_str("3").unwrap();
        assert_eq!(id, ProgramId::new("3"));
    }

    #[test]
    fn program_id_from_json_string() {
        let id: ProgramId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(id, ProgramId::new("3"));
    }

    #[test]
    fn program_id_number_and_string_normalize_equal() {
        let from_number: ProgramId = serde_json::from_str("42").unwrap();
        let from_string: ProgramId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn program_id_serializes_as_string() {
        let id = ProgramId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn effort_uuid_round_trip() {
        let uuid = EffortUuid::new();
        let json = serde_json::to_string(&uuid).unwrap();
        let back: EffortUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(uuid, back);
    }

    #[test]
    fn effort_uuid_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<EffortUuid>().is_err());
    }
}
