//! Process entity - stationary and transportation processes

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{
    EntityKind, EntityRef, Guid, ModeId, ParameterId, ProcessId, ResourceId,
};
use crate::entities::io::{Input, Output, Source};
use crate::entities::technology::EmissionFactor;

/// Process classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    #[default]
    Stationary,
    Transportation,
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessKind::Stationary => write!(f, "stationary"),
            ProcessKind::Transportation => write!(f, "transportation"),
        }
    }
}

/// How the burden of a co-product is handled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Treatment {
    /// Burden split by allocation ratio
    #[default]
    Allocation,
    /// Credit for displacing another product
    Displacement {
        displaced: ResourceId,
        /// Where the displaced product would otherwise have come from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<Source>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ratio: Option<ParameterId>,
    },
}

/// Secondary output of a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoProduct {
    pub output: Output,
    #[serde(default)]
    pub treatment: Treatment,
}

impl CoProduct {
    pub fn displaced_source(&self) -> Option<&Source> {
        match &self.treatment {
            Treatment::Displacement { source, .. } => source.as_ref(),
            Treatment::Allocation => None,
        }
    }

    pub fn displaced_resource(&self) -> Option<ResourceId> {
        match &self.treatment {
            Treatment::Displacement { displaced, .. } => Some(*displaced),
            Treatment::Allocation => None,
        }
    }
}

/// A named group of inputs sharing a purpose (e.g. "process fuels")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputGroup {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Input>,
}

/// Carbon sequestration step fed by an upstream product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequestration {
    pub source: Source,
    pub resource: ResourceId,
    pub amount: ParameterId,
}

/// One leg of a transportation process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportStep {
    pub mode: ModeId,
    pub distance: ParameterId,
    pub share: ParameterId,
}

/// A Process entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,

    pub name: String,

    #[serde(default)]
    pub kind: ProcessKind,

    pub main_output: Output,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub co_products: Vec<CoProduct>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Input>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<InputGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequestration: Option<Sequestration>,

    /// Transportation legs (transportation processes only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TransportStep>,

    /// Non-combustion emissions released on site
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_emissions: Vec<EmissionFactor>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Process {
    pub fn new(id: ProcessId, name: impl Into<String>, main_output: Output) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ProcessKind::default(),
            main_output,
            co_products: Vec::new(),
            inputs: Vec::new(),
            groups: Vec::new(),
            sequestration: None,
            steps: Vec::new(),
            other_emissions: Vec::new(),
            meta: Metadata::default(),
        }
    }

    /// Direct and grouped inputs
    pub fn all_inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.inputs.iter()))
    }

    pub fn all_inputs_mut(&mut self) -> impl Iterator<Item = &mut Input> {
        self.inputs
            .iter_mut()
            .chain(self.groups.iter_mut().flat_map(|g| g.inputs.iter_mut()))
    }

    /// Main output followed by co-product outputs
    pub fn all_outputs(&self) -> impl Iterator<Item = &Output> {
        std::iter::once(&self.main_output).chain(self.co_products.iter().map(|c| &c.output))
    }

    /// Whether `io` names one of this process's inputs or outputs
    pub fn has_io(&self, io: Guid) -> bool {
        self.all_inputs().any(|i| i.id == io) || self.all_outputs().any(|o| o.id == io)
    }

    pub fn has_output(&self, io: Guid) -> bool {
        self.all_outputs().any(|o| o.id == io)
    }
}

impl Entity for Process {
    const KIND: EntityKind = EntityKind::Process;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Process(self.id)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Process {
        let mut p = Process::new(ProcessId(1), "Refining", Output::new(ResourceId(5)));
        p.inputs
            .push(Input::new(ResourceId(1), Source::Well, ParameterId::new("a")));
        p.groups.push(InputGroup {
            name: "process fuels".to_string(),
            inputs: vec![Input::new(ResourceId(2), Source::Well, ParameterId::new("b"))],
        });
        p.co_products.push(CoProduct {
            output: Output::new(ResourceId(7)),
            treatment: Treatment::Displacement {
                displaced: ResourceId(8),
                source: None,
                ratio: None,
            },
        });
        p
    }

    #[test]
    fn test_all_inputs_includes_groups() {
        let p = sample();
        let resources: Vec<_> = p.all_inputs().map(|i| i.resource).collect();
        assert_eq!(resources, vec![ResourceId(1), ResourceId(2)]);
    }

    #[test]
    fn test_has_io() {
        let p = sample();
        let grouped = p.groups[0].inputs[0].id;
        let coproduct = p.co_products[0].output.id;
        assert!(p.has_io(grouped));
        assert!(p.has_io(coproduct));
        assert!(p.has_output(coproduct));
        assert!(!p.has_output(grouped));
        assert!(!p.has_io(Guid::new()));
    }

    #[test]
    fn test_displaced_resource() {
        let p = sample();
        assert_eq!(p.co_products[0].displaced_resource(), Some(ResourceId(8)));
        assert!(p.co_products[0].displaced_source().is_none());
    }
}
