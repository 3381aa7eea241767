//! Entity identity: per-kind integer ids, 128-bit guids and parameter keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity kinds held by the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Production pathway (process network)
    Pathway,
    /// Stationary or transportation process
    Process,
    /// Feedstock / fuel mix
    Mix,
    /// Resource (fuel, feedstock, material)
    Resource,
    /// Combustion technology
    Technology,
    /// Transportation mode
    Mode,
    /// Vehicle
    Vehicle,
}

impl EntityKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Pathway => "pathway",
            EntityKind::Process => "process",
            EntityKind::Mix => "mix",
            EntityKind::Resource => "resource",
            EntityKind::Technology => "technology",
            EntityKind::Mode => "mode",
            EntityKind::Vehicle => "vehicle",
        }
    }

    /// Get all kinds
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Pathway,
            EntityKind::Process,
            EntityKind::Mix,
            EntityKind::Resource,
            EntityKind::Technology,
            EntityKind::Mode,
            EntityKind::Vehicle,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pathway" | "pw" => Ok(EntityKind::Pathway),
            "process" | "proc" => Ok(EntityKind::Process),
            "mix" => Ok(EntityKind::Mix),
            "resource" | "res" => Ok(EntityKind::Resource),
            "technology" | "tech" => Ok(EntityKind::Technology),
            "mode" => Ok(EntityKind::Mode),
            "vehicle" | "veh" => Ok(EntityKind::Vehicle),
            _ => Err(IdParseError::InvalidKind(s.to_string())),
        }
    }
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i32>()
                    .map($name)
                    .map_err(|_| IdParseError::InvalidNumber(s.to_string()))
            }
        }
    };
}

integer_id!(
    /// Pathway identifier
    PathwayId
);
integer_id!(
    /// Process identifier
    ProcessId
);
integer_id!(
    /// Mix identifier
    MixId
);
integer_id!(
    /// Resource identifier, also the species key of resource ledgers
    ResourceId
);
integer_id!(
    /// Technology identifier
    TechnologyId
);
integer_id!(
    /// Transportation mode identifier
    ModeId
);
integer_id!(
    /// Vehicle identifier
    VehicleId
);
integer_id!(
    /// Pollutant identifier, the species key of emission ledgers
    PollutantId
);
integer_id!(
    /// Resource or pollutant group identifier
    GroupId
);

/// 128-bit identifier of pathway vertices, inputs and outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Ulid);

impl Guid {
    /// Mint a fresh guid
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Guid {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Guid)
            .map_err(|e| IdParseError::InvalidGuid(s.to_string(), e.to_string()))
    }
}

/// Key of a parameter in the global parameter table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterId(pub String);

impl ParameterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParameterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParameterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed reference to one entity of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Pathway(PathwayId),
    Process(ProcessId),
    Mix(MixId),
    Resource(ResourceId),
    Technology(TechnologyId),
    Mode(ModeId),
    Vehicle(VehicleId),
}

impl EntityRef {
    /// Build a reference from a kind and a raw id
    pub fn new(kind: EntityKind, id: i32) -> Self {
        match kind {
            EntityKind::Pathway => EntityRef::Pathway(PathwayId(id)),
            EntityKind::Process => EntityRef::Process(ProcessId(id)),
            EntityKind::Mix => EntityRef::Mix(MixId(id)),
            EntityKind::Resource => EntityRef::Resource(ResourceId(id)),
            EntityKind::Technology => EntityRef::Technology(TechnologyId(id)),
            EntityKind::Mode => EntityRef::Mode(ModeId(id)),
            EntityKind::Vehicle => EntityRef::Vehicle(VehicleId(id)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Pathway(_) => EntityKind::Pathway,
            EntityRef::Process(_) => EntityKind::Process,
            EntityRef::Mix(_) => EntityKind::Mix,
            EntityRef::Resource(_) => EntityKind::Resource,
            EntityRef::Technology(_) => EntityKind::Technology,
            EntityRef::Mode(_) => EntityKind::Mode,
            EntityRef::Vehicle(_) => EntityKind::Vehicle,
        }
    }

    /// Raw integer id within the kind's collection
    pub fn raw_id(&self) -> i32 {
        match self {
            EntityRef::Pathway(id) => id.0,
            EntityRef::Process(id) => id.0,
            EntityRef::Mix(id) => id.0,
            EntityRef::Resource(id) => id.0,
            EntityRef::Technology(id) => id.0,
            EntityRef::Mode(id) => id.0,
            EntityRef::Vehicle(id) => id.0,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw_id())
    }
}

impl FromStr for EntityRef {
    type Err = IdParseError;

    /// Parse `kind:id`, e.g. `pathway:10`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;
        let kind: EntityKind = kind.parse()?;
        let id = id
            .trim()
            .parse::<i32>()
            .map_err(|_| IdParseError::InvalidNumber(id.to_string()))?;
        Ok(EntityRef::new(kind, id))
    }
}

/// Errors that can occur when parsing identifiers
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity kind: '{0}' (valid: pathway, process, mix, resource, technology, mode, vehicle)")]
    InvalidKind(String),

    #[error("missing ':' delimiter in entity reference: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid numeric id: '{0}'")]
    InvalidNumber(String),

    #[error("invalid guid '{0}': {1}")]
    InvalidGuid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_parsing() {
        let r: EntityRef = "pathway:10".parse().unwrap();
        assert_eq!(r, EntityRef::Pathway(PathwayId(10)));
        assert_eq!(r.to_string(), "pathway:10");
    }

    #[test]
    fn test_entity_ref_kind_aliases() {
        let r: EntityRef = "tech:3".parse().unwrap();
        assert_eq!(r.kind(), EntityKind::Technology);
        assert_eq!(r.raw_id(), 3);
    }

    #[test]
    fn test_entity_ref_invalid_kind() {
        let err = "widget:1".parse::<EntityRef>().unwrap_err();
        assert!(matches!(err, IdParseError::InvalidKind(_)));
    }

    #[test]
    fn test_entity_ref_missing_delimiter() {
        let err = "mix20".parse::<EntityRef>().unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_guid_roundtrip() {
        let g = Guid::new();
        let parsed: Guid = g.to_string().parse().unwrap();
        assert_eq!(g, parsed);
    }

    #[test]
    fn test_guid_invalid() {
        let err = "notaulid".parse::<Guid>().unwrap_err();
        assert!(matches!(err, IdParseError::InvalidGuid(_, _)));
    }

    #[test]
    fn test_all_kinds_parse() {
        for kind in EntityKind::all() {
            let parsed: EntityKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }
}
