//! Vehicle entity - fuel and material consumers

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{EntityKind, EntityRef, ParameterId, ResourceId, VehicleId};
use crate::entities::io::Source;

/// A fuel burned by the vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFuel {
    pub resource: ResourceId,
    #[serde(default)]
    pub source: Source,
    pub share: ParameterId,
}

/// A material the vehicle is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleMaterial {
    pub resource: ResourceId,
    #[serde(default)]
    pub source: Source,
    pub mass: ParameterId,
}

/// A Vehicle entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_economy: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fuels: Vec<VehicleFuel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<VehicleMaterial>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Vehicle {
    pub fn new(id: VehicleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fuel_economy: None,
            fuels: Vec::new(),
            materials: Vec::new(),
            meta: Metadata::default(),
        }
    }

    /// Sources of every fuel and material
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.fuels
            .iter()
            .map(|f| &f.source)
            .chain(self.materials.iter().map(|m| &m.source))
    }
}

impl Entity for Vehicle {
    const KIND: EntityKind = EntityKind::Vehicle;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Vehicle(self.id)
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
