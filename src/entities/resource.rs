//! Resource entity - fuels, feedstocks and materials

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{EntityKind, EntityRef, GroupId, ParameterId, ResourceId};

/// Physical state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    #[default]
    Solid,
    Liquid,
    Gas,
    Electricity,
}

/// A Resource entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,

    pub name: String,

    #[serde(default)]
    pub state: ResourceState,

    /// Resource groups this resource belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupId>,

    /// Resource this one may substitute in calculations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_with: Option<ResourceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating_value: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_ratio: Option<ParameterId>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: ResourceState::default(),
            groups: Vec::new(),
            compatible_with: None,
            heating_value: None,
            density: None,
            carbon_ratio: None,
            meta: Metadata::default(),
        }
    }
}

impl Entity for Resource {
    const KIND: EntityKind = EntityKind::Resource;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Resource(self.id)
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
