//! Entity graph - keyed collections of every entity kind plus the parameter table
//!
//! Collections are id-keyed maps in memory and plain lists on disk. Members
//! reference each other by id only; there is no reverse index, so "who uses
//! X" questions are answered by scanning (see [`crate::resolver`]).

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{
    EntityKind, EntityRef, MixId, ModeId, ParameterId, PathwayId, ProcessId, ResourceId,
    TechnologyId, VehicleId,
};
use crate::entities::{
    Mix, Mode, Parameter, Pathway, PathwayError, Process, Resource, Technology, Vehicle,
};
use crate::ledger::species::{Pollutant, SpeciesGroup, SpeciesTable};

/// Errors raised by graph bookkeeping
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{0} already exists")]
    DuplicateId(EntityRef),

    #[error("{0} not found")]
    NotFound(EntityRef),

    #[error("parameter '{0}' already exists")]
    DuplicateParameter(ParameterId),

    #[error("parameter '{0}' not found")]
    UnknownParameter(ParameterId),

    #[error(transparent)]
    Pathway(#[from] PathwayError),
}

/// Items stored in a keyed collection
pub trait Keyed {
    type Key: Ord + Clone + fmt::Display;

    fn key(&self) -> Self::Key;
}

macro_rules! keyed_entity {
    ($($ty:ty => $key:ty),* $(,)?) => {
        $(
            impl Keyed for $ty {
                type Key = $key;

                fn key(&self) -> $key {
                    self.id
                }
            }
        )*
    };
}

keyed_entity!(
    Pathway => PathwayId,
    Process => ProcessId,
    Mix => MixId,
    Resource => ResourceId,
    Technology => TechnologyId,
    Mode => ModeId,
    Vehicle => VehicleId,
);

impl Keyed for Parameter {
    type Key = ParameterId;

    fn key(&self) -> ParameterId {
        self.id.clone()
    }
}

/// Serde adapter storing a keyed map as a list of its values
mod keyed {
    use super::*;

    pub fn serialize<S, K, T>(map: &BTreeMap<K, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<T::Key, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Keyed + Deserialize<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for item in items {
            let key = item.key();
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate id {}", key)));
            }
            map.insert(key, item);
        }
        Ok(map)
    }
}

/// The flat table of parameters any entity may reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    entries: BTreeMap<ParameterId, Parameter>,
}

impl Serialize for ParameterTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        keyed::serialize(&self.entries, serializer)
    }
}

impl<'de> Deserialize<'de> for ParameterTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            entries: keyed::deserialize(deserializer)?,
        })
    }
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ParameterId) -> Option<&Parameter> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ParameterId) -> bool {
        self.entries.contains_key(id)
    }

    /// Look a parameter up by its human name
    pub fn get_by_name(&self, name: &str) -> Option<&Parameter> {
        if name.is_empty() {
            return None;
        }
        self.entries.values().find(|p| p.name == name)
    }

    /// Register a parameter; an existing id is rejected
    pub fn insert(&mut self, parameter: Parameter) -> Result<(), GraphError> {
        if self.entries.contains_key(&parameter.id) {
            return Err(GraphError::DuplicateParameter(parameter.id));
        }
        self.entries.insert(parameter.id.clone(), parameter);
        Ok(())
    }

    pub fn remove(&mut self, id: &ParameterId) -> Option<Parameter> {
        self.entries.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.values()
    }

    /// Every parameter carrying a non-empty formula
    pub fn formulas(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.values().filter(|p| p.has_formula())
    }
}

impl FromIterator<Parameter> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

/// Borrowed view of any one entity
#[derive(Debug, Clone, Copy)]
pub enum EntityView<'g> {
    Pathway(&'g Pathway),
    Process(&'g Process),
    Mix(&'g Mix),
    Resource(&'g Resource),
    Technology(&'g Technology),
    Mode(&'g Mode),
    Vehicle(&'g Vehicle),
}

impl<'g> EntityView<'g> {
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            EntityView::Pathway(e) => e.entity_ref(),
            EntityView::Process(e) => e.entity_ref(),
            EntityView::Mix(e) => e.entity_ref(),
            EntityView::Resource(e) => e.entity_ref(),
            EntityView::Technology(e) => e.entity_ref(),
            EntityView::Mode(e) => e.entity_ref(),
            EntityView::Vehicle(e) => e.entity_ref(),
        }
    }

    pub fn name(&self) -> &'g str {
        match self {
            EntityView::Pathway(e) => &e.name,
            EntityView::Process(e) => &e.name,
            EntityView::Mix(e) => &e.name,
            EntityView::Resource(e) => &e.name,
            EntityView::Technology(e) => &e.name,
            EntityView::Mode(e) => &e.name,
            EntityView::Vehicle(e) => &e.name,
        }
    }

    pub fn metadata(&self) -> &'g Metadata {
        match self {
            EntityView::Pathway(e) => &e.meta,
            EntityView::Process(e) => &e.meta,
            EntityView::Mix(e) => &e.meta,
            EntityView::Resource(e) => &e.meta,
            EntityView::Technology(e) => &e.meta,
            EntityView::Mode(e) => &e.meta,
            EntityView::Vehicle(e) => &e.meta,
        }
    }

    pub fn is_discarded(&self) -> bool {
        self.metadata().discarded
    }
}

/// The dataset: every entity collection, the species tables and the parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityGraph {
    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub pathways: BTreeMap<PathwayId, Pathway>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub processes: BTreeMap<ProcessId, Process>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub mixes: BTreeMap<MixId, Mix>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<ResourceId, Resource>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub technologies: BTreeMap<TechnologyId, Technology>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub modes: BTreeMap<ModeId, Mode>,

    #[serde(default, with = "keyed", skip_serializing_if = "BTreeMap::is_empty")]
    pub vehicles: BTreeMap<VehicleId, Vehicle>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pollutants: Vec<Pollutant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<SpeciesGroup>,

    #[serde(default, skip_serializing_if = "ParameterTable::is_empty")]
    pub parameters: ParameterTable,
}

macro_rules! insert_into {
    ($map:expr, $entity:expr) => {{
        let entity = $entity;
        if $map.contains_key(&entity.id) {
            return Err(GraphError::DuplicateId(entity.entity_ref()));
        }
        $map.insert(entity.id, entity);
        Ok(())
    }};
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pathway(&mut self, pathway: Pathway) -> Result<(), GraphError> {
        insert_into!(self.pathways, pathway)
    }

    pub fn add_process(&mut self, process: Process) -> Result<(), GraphError> {
        insert_into!(self.processes, process)
    }

    pub fn add_mix(&mut self, mix: Mix) -> Result<(), GraphError> {
        insert_into!(self.mixes, mix)
    }

    pub fn add_resource(&mut self, resource: Resource) -> Result<(), GraphError> {
        insert_into!(self.resources, resource)
    }

    pub fn add_technology(&mut self, technology: Technology) -> Result<(), GraphError> {
        insert_into!(self.technologies, technology)
    }

    pub fn add_mode(&mut self, mode: Mode) -> Result<(), GraphError> {
        insert_into!(self.modes, mode)
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<(), GraphError> {
        insert_into!(self.vehicles, vehicle)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), GraphError> {
        self.parameters.insert(parameter)
    }

    /// Borrow one entity by reference
    pub fn entity(&self, entity: EntityRef) -> Option<EntityView<'_>> {
        match entity {
            EntityRef::Pathway(id) => self.pathways.get(&id).map(EntityView::Pathway),
            EntityRef::Process(id) => self.processes.get(&id).map(EntityView::Process),
            EntityRef::Mix(id) => self.mixes.get(&id).map(EntityView::Mix),
            EntityRef::Resource(id) => self.resources.get(&id).map(EntityView::Resource),
            EntityRef::Technology(id) => self.technologies.get(&id).map(EntityView::Technology),
            EntityRef::Mode(id) => self.modes.get(&id).map(EntityView::Mode),
            EntityRef::Vehicle(id) => self.vehicles.get(&id).map(EntityView::Vehicle),
        }
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.entity(entity).is_some()
    }

    pub fn name_of(&self, entity: EntityRef) -> Option<&str> {
        self.entity(entity).map(|e| e.name())
    }

    pub fn metadata(&self, entity: EntityRef) -> Option<&Metadata> {
        self.entity(entity).map(|e| e.metadata())
    }

    pub fn metadata_mut(&mut self, entity: EntityRef) -> Option<&mut Metadata> {
        match entity {
            EntityRef::Pathway(id) => self.pathways.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Process(id) => self.processes.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Mix(id) => self.mixes.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Resource(id) => self.resources.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Technology(id) => self.technologies.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Mode(id) => self.modes.get_mut(&id).map(|e| e.metadata_mut()),
            EntityRef::Vehicle(id) => self.vehicles.get_mut(&id).map(|e| e.metadata_mut()),
        }
    }

    pub fn is_discarded(&self, entity: EntityRef) -> bool {
        self.metadata(entity).is_some_and(|m| m.discarded)
    }

    /// Soft-delete an entity
    pub fn discard(&mut self, entity: EntityRef) -> Result<(), GraphError> {
        let meta = self
            .metadata_mut(entity)
            .ok_or(GraphError::NotFound(entity))?;
        meta.discarded = true;
        Ok(())
    }

    /// Every id of one kind, discarded ones included, in ascending order
    pub fn refs(&self, kind: EntityKind) -> Vec<EntityRef> {
        fn collect<K: Copy>(map: &BTreeMap<K, impl Sized>, f: impl Fn(K) -> EntityRef) -> Vec<EntityRef> {
            map.keys().map(|k| f(*k)).collect()
        }
        match kind {
            EntityKind::Pathway => collect(&self.pathways, EntityRef::Pathway),
            EntityKind::Process => collect(&self.processes, EntityRef::Process),
            EntityKind::Mix => collect(&self.mixes, EntityRef::Mix),
            EntityKind::Resource => collect(&self.resources, EntityRef::Resource),
            EntityKind::Technology => collect(&self.technologies, EntityRef::Technology),
            EntityKind::Mode => collect(&self.modes, EntityRef::Mode),
            EntityKind::Vehicle => collect(&self.vehicles, EntityRef::Vehicle),
        }
    }

    /// Largest raw id in use for a kind, or 0 for an empty collection
    pub fn max_id(&self, kind: EntityKind) -> i32 {
        self.refs(kind).last().map_or(0, |r| r.raw_id().max(0))
    }

    /// Every entity of one kind
    pub fn entities_of(&self, kind: EntityKind) -> Box<dyn Iterator<Item = EntityView<'_>> + '_> {
        match kind {
            EntityKind::Pathway => Box::new(self.pathways.values().map(EntityView::Pathway)),
            EntityKind::Process => Box::new(self.processes.values().map(EntityView::Process)),
            EntityKind::Mix => Box::new(self.mixes.values().map(EntityView::Mix)),
            EntityKind::Resource => Box::new(self.resources.values().map(EntityView::Resource)),
            EntityKind::Technology => {
                Box::new(self.technologies.values().map(EntityView::Technology))
            }
            EntityKind::Mode => Box::new(self.modes.values().map(EntityView::Mode)),
            EntityKind::Vehicle => Box::new(self.vehicles.values().map(EntityView::Vehicle)),
        }
    }

    /// Every entity of every kind
    pub fn all_entities(&self) -> impl Iterator<Item = EntityView<'_>> + '_ {
        EntityKind::all()
            .iter()
            .flat_map(move |kind| self.entities_of(*kind))
    }

    /// Species membership tables used by ledger group rollups
    pub fn species_table(&self) -> SpeciesTable {
        let mut table = SpeciesTable::new();
        for group in &self.groups {
            table.add_group(group.clone());
        }
        for pollutant in &self.pollutants {
            table.add_pollutant(pollutant.clone());
        }
        for resource in self.resources.values() {
            table.add_resource(resource.id, resource.groups.clone());
        }
        table
    }

    /// Check that every pathway edge resolves inside its pathway
    pub fn check_pathways(&self) -> Result<(), GraphError> {
        for pathway in self.pathways.values() {
            for edge in &pathway.edges {
                if !pathway.vertices.contains_key(&edge.from.vertex) {
                    return Err(PathwayError::DanglingEndpoint(edge.from.vertex, pathway.id).into());
                }
                if !pathway.resolves(&edge.to) {
                    return Err(PathwayError::DanglingEndpoint(edge.to.vertex, pathway.id).into());
                }
            }
            if let Some(main) = pathway.main_output {
                if pathway.output(main).is_none() {
                    return Err(PathwayError::UnknownOutput(main, pathway.id).into());
                }
            }
        }
        Ok(())
    }
}
