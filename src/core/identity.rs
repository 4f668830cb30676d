//! Entity identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Requirement referenced by acceptance criteria
    Req,
    /// Acceptance criterion
    Crit,
    /// Criterion evaluation record
    Eval,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Req => "REQ",
            EntityPrefix::Crit => "CRIT",
            EntityPrefix::Eval => "EVAL",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[EntityPrefix::Req, EntityPrefix::Crit, EntityPrefix::Eval]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REQ" => Ok(EntityPrefix::Req),
            "CRIT" => Ok(EntityPrefix::Crit),
            "EVAL" => Ok(EntityPrefix::Eval),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Create an EntityId from a prefix and existing ULID
    pub fn from_parts(prefix: EntityPrefix, ulid: Ulid) -> Self {
        Self { prefix, ulid }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors from parsing entity IDs
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IdParseError {
    #[error("Invalid entity prefix: {0}")]
    InvalidPrefix(String),

    #[error("Missing '-' delimiter in entity ID: {0}")]
    MissingDelimiter(String),

    #[error("Invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix() {
        let id = EntityId::new(EntityPrefix::Crit);
        assert!(id.to_string().starts_with("CRIT-"));
        assert_eq!(id.prefix(), EntityPrefix::Crit);
    }

    #[test]
    fn test_id_roundtrip() {
        let id = EntityId::new(EntityPrefix::Eval);
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_invalid_prefix() {
        let err = "BOGUS-01ARZ3NDEKTSV4RRFFQ69G5FAV".parse::<EntityId>();
        assert!(matches!(err, Err(IdParseError::InvalidPrefix(_))));
    }

    #[test]
    fn test_parse_missing_delimiter() {
        let err = "CRIT".parse::<EntityId>();
        assert!(matches!(err, Err(IdParseError::MissingDelimiter(_))));
    }

    #[test]
    fn test_parse_invalid_ulid() {
        let err = "CRIT-notaulid".parse::<EntityId>();
        assert!(matches!(err, Err(IdParseError::InvalidUlid(_, _))));
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::new(EntityPrefix::Crit);
        let yaml = serde_yml::to_string(&id).unwrap();
        assert!(yaml.contains("CRIT-"));
        let back: EntityId = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_prefix_from_str_case_insensitive() {
        assert_eq!("crit".parse::<EntityPrefix>().unwrap(), EntityPrefix::Crit);
        assert_eq!("EVAL".parse::<EntityPrefix>().unwrap(), EntityPrefix::Eval);
    }
}
