//! Entity identity - prefixed ULID identifiers
//!
//! IDs look like `PSV-01J9Z3K7W2Q4M8N6P0R5T1V3X7`: a kind prefix, a dash, and a
//! ULID. The prefix makes IDs self-describing, so a store can locate a record
//! from its ID alone.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

use crate::core::entity::EntityKind;

/// Errors from parsing an ID string
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum IdParseError {
    #[error("ID '{0}' is missing the PREFIX- part")]
    #[diagnostic(code(psvt::id::missing_prefix))]
    MissingPrefix(String),

    #[error("unknown ID prefix '{0}'")]
    #[diagnostic(
        code(psvt::id::unknown_prefix),
        help("valid prefixes: CUS, PLT, UNT, AREA, PSV, SCN, SZC, REV")
    )]
    UnknownPrefix(String),

    #[error("invalid ULID in ID '{0}'")]
    #[diagnostic(code(psvt::id::invalid_ulid))]
    InvalidUlid(String),
}

/// Split `PREFIX-ULID` into its two halves
fn split_id(s: &str) -> Result<(&str, Ulid), IdParseError> {
    let (prefix, rest) = s
        .split_once('-')
        .ok_or_else(|| IdParseError::MissingPrefix(s.to_string()))?;
    let ulid = Ulid::from_string(rest).map_err(|_| IdParseError::InvalidUlid(s.to_string()))?;
    Ok((prefix, ulid))
}

/// Identifier of a hierarchy node or workflow entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    kind: EntityKind,
    ulid: Ulid,
}

impl EntityId {
    /// Generate a fresh ID for the given kind
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            ulid: Ulid::new(),
        }
    }

    /// The entity kind encoded in the prefix
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn ulid(&self) -> Ulid {
        self.ulid
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, ulid) = split_id(s)?;
        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| IdParseError::UnknownPrefix(prefix.to_string()))?;
        Ok(Self { kind, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a revision record (`REV-<ULID>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionId(Ulid);

impl RevisionId {
    pub const PREFIX: &'static str = "REV";

    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RevisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl FromStr for RevisionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, ulid) = split_id(s)?;
        if !prefix.eq_ignore_ascii_case(Self::PREFIX) {
            return Err(IdParseError::UnknownPrefix(prefix.to_string()));
        }
        Ok(Self(ulid))
    }
}

impl Serialize for RevisionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(EntityKind::ProtectiveSystem);
        let s = id.to_string();
        assert!(s.starts_with("PSV-"));
        let parsed: EntityId = s.parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.kind(), EntityKind::ProtectiveSystem);
    }

    #[test]
    fn test_entity_id_prefix_is_case_insensitive() {
        let id = EntityId::new(EntityKind::Area);
        let lowered = id.to_string().replacen("AREA", "area", 1);
        assert_eq!(lowered.parse::<EntityId>().unwrap(), id);
    }

    #[test]
    fn test_entity_id_errors() {
        assert!(matches!(
            "PSV01J9Z3K7W2Q4M8N6P0R5T1V3X7".parse::<EntityId>(),
            Err(IdParseError::MissingPrefix(_))
        ));
        assert!(matches!(
            "XYZ-01J9Z3K7W2Q4M8N6P0R5T1V3X7".parse::<EntityId>(),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "PSV-not-a-ulid".parse::<EntityId>(),
            Err(IdParseError::InvalidUlid(_))
        ));
    }

    #[test]
    fn test_revision_id_rejects_entity_prefix() {
        let rev = RevisionId::new();
        assert_eq!(rev.to_string().parse::<RevisionId>().unwrap(), rev);

        let entity = EntityId::new(EntityKind::Scenario).to_string();
        assert!(entity.parse::<RevisionId>().is_err());
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let id = EntityId::new(EntityKind::SizingCase);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
