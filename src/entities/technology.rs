//! Technology entity - combustion technologies and their emission factors

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{EntityKind, EntityRef, ParameterId, PollutantId, ResourceId, TechnologyId};

/// Pollutant released per unit of activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub pollutant: PollutantId,
    pub factor: ParameterId,
}

/// A Technology entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub id: TechnologyId,

    pub name: String,

    /// Fuel burned by the technology
    pub input_resource: ResourceId,

    /// Technology whose factors this one inherits unless overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_technology: Option<TechnologyId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emission_factors: Vec<EmissionFactor>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Technology {
    pub fn new(id: TechnologyId, name: impl Into<String>, input_resource: ResourceId) -> Self {
        Self {
            id,
            name: name.into(),
            input_resource,
            base_technology: None,
            emission_factors: Vec::new(),
            meta: Metadata::default(),
        }
    }

    /// Factor parameter for a pollutant, if declared on this technology
    pub fn factor_for(&self, pollutant: PollutantId) -> Option<&ParameterId> {
        self.emission_factors
            .iter()
            .find(|f| f.pollutant == pollutant)
            .map(|f| &f.factor)
    }
}

impl Entity for Technology {
    const KIND: EntityKind = EntityKind::Technology;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Technology(self.id)
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
