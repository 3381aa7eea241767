//! Mode entity - transportation modes and their fuel shares

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{EntityKind, EntityRef, Guid, ModeId, ParameterId, ResourceId, TechnologyId};
use crate::entities::io::Source;

/// Transportation mode classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    #[default]
    Truck,
    Rail,
    Ship,
    Pipeline,
    Connector,
}

/// Energy carrier used by a mode, with the technology pair it runs on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    pub resource: ResourceId,

    #[serde(default)]
    pub source: Source,

    /// Technology used on the outbound leg
    pub technology_from: TechnologyId,

    /// Technology used on the return leg
    pub technology_to: TechnologyId,

    pub share: ParameterId,
}

impl EnergySource {
    pub fn uses_technology(&self, technology: TechnologyId) -> bool {
        self.technology_from == technology || self.technology_to == technology
    }
}

/// A named fuel-share scenario of a mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelShare {
    #[serde(default)]
    pub id: Guid,

    pub name: String,

    #[serde(default)]
    pub energy_sources: Vec<EnergySource>,
}

/// A Mode entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    pub id: ModeId,

    pub name: String,

    #[serde(default)]
    pub kind: ModeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_intensity: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fuel_shares: Vec<FuelShare>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Mode {
    pub fn new(id: ModeId, name: impl Into<String>, kind: ModeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            payload: None,
            energy_intensity: None,
            fuel_shares: Vec::new(),
            meta: Metadata::default(),
        }
    }

    pub fn energy_sources(&self) -> impl Iterator<Item = &EnergySource> {
        self.fuel_shares.iter().flat_map(|fs| fs.energy_sources.iter())
    }
}

impl Entity for Mode {
    const KIND: EntityKind = EntityKind::Mode;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Mode(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }
}
