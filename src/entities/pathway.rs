//! Pathway entity - a network of processes and mixes producing a resource
//!
//! A pathway holds its own small graph: [`Vertex`]es wrapping a process, mix
//! or nested pathway, [`Edge`]s carrying an output of one vertex to an input
//! of another (or to a pathway-level [`PathwayOutput`]), and the outputs it
//! exposes to the rest of the dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{
    EntityKind, EntityRef, Guid, MixId, ParameterId, PathwayId, ProcessId, ResourceId,
};

/// Model wrapped by a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum VertexModel {
    Process(ProcessId),
    Mix(MixId),
    Pathway(PathwayId),
}

impl VertexModel {
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            VertexModel::Process(id) => EntityRef::Process(*id),
            VertexModel::Mix(id) => EntityRef::Mix(*id),
            VertexModel::Pathway(id) => EntityRef::Pathway(*id),
        }
    }
}

/// A node of the pathway graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: Guid,
    pub model: VertexModel,
}

/// One side of an edge: a vertex and one of its inputs or outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub vertex: Guid,
    pub io: Guid,
}

impl Endpoint {
    pub fn new(vertex: Guid, io: Guid) -> Self {
        Self { vertex, io }
    }

    /// Sink endpoint standing for a pathway-level output
    pub fn pathway_output(output: Guid) -> Self {
        Self {
            vertex: output,
            io: output,
        }
    }
}

/// Directed connection from a producing output to a consuming input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: Endpoint,
    pub to: Endpoint,
}

/// Output exposed at pathway level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayOutput {
    pub id: Guid,

    pub resource: ResourceId,

    /// Fraction lost between the internal output and the pathway boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<ParameterId>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Result of inserting an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    AlreadyPresent,
}

/// Structural errors of the pathway graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathwayError {
    #[error("edge endpoint {0} does not resolve inside pathway {1}")]
    DanglingEndpoint(Guid, PathwayId),

    #[error("output {0} is not an output of pathway {1}")]
    UnknownOutput(Guid, PathwayId),
}

/// A Pathway entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub id: PathwayId,

    pub name: String,

    /// Resource delivered by the main output
    pub output_resource: ResourceId,

    #[serde(default)]
    pub vertices: BTreeMap<Guid, Vertex>,

    #[serde(default)]
    pub edges: Vec<Edge>,

    #[serde(default)]
    pub outputs: Vec<PathwayOutput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_output: Option<Guid>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Pathway {
    pub fn new(id: PathwayId, name: impl Into<String>, output_resource: ResourceId) -> Self {
        Self {
            id,
            name: name.into(),
            output_resource,
            vertices: BTreeMap::new(),
            edges: Vec::new(),
            outputs: Vec::new(),
            main_output: None,
            meta: Metadata::default(),
        }
    }

    /// Add a vertex wrapping `model`, returning its fresh guid
    pub fn add_vertex(&mut self, model: VertexModel) -> Guid {
        let id = Guid::new();
        self.vertices.insert(id, Vertex { id, model });
        id
    }

    /// Add a pathway-level output, returning its fresh guid
    pub fn add_output(&mut self, resource: ResourceId) -> Guid {
        let id = Guid::new();
        self.outputs.push(PathwayOutput {
            id,
            resource,
            loss: None,
            notes: String::new(),
        });
        id
    }

    pub fn output(&self, id: Guid) -> Option<&PathwayOutput> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Flag one output as the main output
    pub fn set_main_output(&mut self, id: Guid) -> Result<(), PathwayError> {
        if self.output(id).is_none() {
            return Err(PathwayError::UnknownOutput(id, self.id));
        }
        self.main_output = Some(id);
        Ok(())
    }

    /// Whether an endpoint names a vertex or an output of this pathway
    pub fn resolves(&self, endpoint: &Endpoint) -> bool {
        self.vertices.contains_key(&endpoint.vertex)
            || (endpoint.vertex == endpoint.io && self.output(endpoint.vertex).is_some())
    }

    /// Insert an edge; a structurally identical edge is not inserted twice
    pub fn insert_edge(&mut self, edge: Edge) -> Result<EdgeInsert, PathwayError> {
        if !self.vertices.contains_key(&edge.from.vertex) {
            return Err(PathwayError::DanglingEndpoint(edge.from.vertex, self.id));
        }
        if !self.resolves(&edge.to) {
            return Err(PathwayError::DanglingEndpoint(edge.to.vertex, self.id));
        }
        if self.edges.contains(&edge) {
            return Ok(EdgeInsert::AlreadyPresent);
        }
        self.edges.push(edge);
        Ok(EdgeInsert::Added)
    }

    /// Connect an internal output to a pathway-level output
    pub fn expose(&mut self, from: Endpoint, output: Guid) -> Result<EdgeInsert, PathwayError> {
        self.insert_edge(Edge {
            from,
            to: Endpoint::pathway_output(output),
        })
    }

    /// Output referenced by a consumer: the named one, or the main output
    pub fn effective_output(&self, requested: Option<Guid>) -> Option<Guid> {
        requested.or(self.main_output)
    }

    pub fn models(&self) -> impl Iterator<Item = &VertexModel> {
        self.vertices.values().map(|v| &v.model)
    }
}

impl Entity for Pathway {
    const KIND: EntityKind = EntityKind::Pathway;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Pathway(self.id)
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
