//! Deep copies of pathways, processes and mixes under fresh identifiers
//!
//! A copy keeps the structure of its source: vertices and outputs are
//! re-minted first, then every edge is rewritten through the old-to-new guid
//! maps. Owned parameters are registered again under fresh ids so the copy can
//! be edited without touching the original.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::config::DEFAULT_COPY_SUFFIX;
use crate::core::identity::{
    EntityKind, EntityRef, Guid, MixId, ParameterId, PathwayId, ProcessId,
};
use crate::core::ids::IdGenerator;
use crate::entities::{Edge, Endpoint, Parameter, PathwayOutput, Vertex};
use crate::graph::{EntityGraph, GraphError};
use crate::resolver::visit::RemapParameters;

#[derive(Debug, Error)]
pub enum DuplicateError {
    #[error("{0} not found")]
    NotFound(EntityRef),

    #[error("{0} entities cannot be duplicated (supported: pathway, process, mix)")]
    Unsupported(EntityKind),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Append `suffix` to `base` until `taken` no longer matches
///
/// An empty suffix falls back to [`DEFAULT_COPY_SUFFIX`].
pub fn unique_name(base: &str, suffix: &str, taken: impl Fn(&str) -> bool) -> String {
    let suffix = if suffix.is_empty() {
        DEFAULT_COPY_SUFFIX
    } else {
        suffix
    };
    let mut candidate = format!("{}{}", base, suffix);
    while taken(&candidate) {
        candidate.push_str(suffix);
    }
    candidate
}

/// Duplicate any supported entity
pub fn duplicate(
    graph: &mut EntityGraph,
    ids: &mut dyn IdGenerator,
    entity: EntityRef,
    suffix: &str,
) -> Result<EntityRef, DuplicateError> {
    match entity {
        EntityRef::Pathway(id) => duplicate_pathway(graph, ids, id, suffix).map(EntityRef::Pathway),
        EntityRef::Process(id) => duplicate_process(graph, ids, id, suffix).map(EntityRef::Process),
        EntityRef::Mix(id) => duplicate_mix(graph, ids, id, suffix).map(EntityRef::Mix),
        other => Err(DuplicateError::Unsupported(other.kind())),
    }
}

pub fn duplicate_pathway(
    graph: &mut EntityGraph,
    ids: &mut dyn IdGenerator,
    id: PathwayId,
    suffix: &str,
) -> Result<PathwayId, DuplicateError> {
    let source = graph
        .pathways
        .get(&id)
        .cloned()
        .ok_or(DuplicateError::NotFound(EntityRef::Pathway(id)))?;

    let mut copy = source.clone();
    copy.id = PathwayId(ids.next_id(EntityKind::Pathway));
    copy.name = unique_name(&source.name, suffix, |name| {
        graph.pathways.values().any(|p| p.name == name)
    });

    let mut vertex_map = BTreeMap::new();
    copy.vertices = source
        .vertices
        .values()
        .map(|v| {
            let fresh = ids.new_guid();
            vertex_map.insert(v.id, fresh);
            (
                fresh,
                Vertex {
                    id: fresh,
                    model: v.model,
                },
            )
        })
        .collect();

    let mut output_map = BTreeMap::new();
    copy.outputs = source
        .outputs
        .iter()
        .map(|o| {
            let fresh = ids.new_guid();
            output_map.insert(o.id, fresh);
            PathwayOutput {
                id: fresh,
                ..o.clone()
            }
        })
        .collect();

    copy.edges = Vec::with_capacity(source.edges.len());
    for edge in &source.edges {
        match remap_edge(edge, &vertex_map, &output_map) {
            Some(remapped) => copy.edges.push(remapped),
            None => tracing::warn!(
                pathway = %source.id,
                from = %edge.from.vertex,
                to = %edge.to.vertex,
                "dropping edge with an unresolved endpoint"
            ),
        }
    }

    copy.main_output = source
        .main_output
        .and_then(|main| output_map.get(&main).copied());

    let new_id = copy.id;
    ensure_free(graph, EntityRef::Pathway(new_id))?;
    reregister_parameters(graph, ids, &mut copy, suffix)?;
    graph.add_pathway(copy)?;
    tracing::debug!(from = %id, to = %new_id, "pathway duplicated");
    Ok(new_id)
}

pub fn duplicate_process(
    graph: &mut EntityGraph,
    ids: &mut dyn IdGenerator,
    id: ProcessId,
    suffix: &str,
) -> Result<ProcessId, DuplicateError> {
    let source = graph
        .processes
        .get(&id)
        .ok_or(DuplicateError::NotFound(EntityRef::Process(id)))?;

    let mut copy = source.clone();
    copy.id = ProcessId(ids.next_id(EntityKind::Process));
    copy.name = unique_name(&source.name, suffix, |name| {
        graph.processes.values().any(|p| p.name == name)
    });

    copy.main_output.id = ids.new_guid();
    for co_product in &mut copy.co_products {
        co_product.output.id = ids.new_guid();
    }
    for input in copy.all_inputs_mut() {
        input.id = ids.new_guid();
    }

    let new_id = copy.id;
    ensure_free(graph, EntityRef::Process(new_id))?;
    reregister_parameters(graph, ids, &mut copy, suffix)?;
    graph.add_process(copy)?;
    tracing::debug!(from = %id, to = %new_id, "process duplicated");
    Ok(new_id)
}

pub fn duplicate_mix(
    graph: &mut EntityGraph,
    ids: &mut dyn IdGenerator,
    id: MixId,
    suffix: &str,
) -> Result<MixId, DuplicateError> {
    let source = graph
        .mixes
        .get(&id)
        .ok_or(DuplicateError::NotFound(EntityRef::Mix(id)))?;

    let mut copy = source.clone();
    copy.id = MixId(ids.next_id(EntityKind::Mix));
    copy.name = unique_name(&source.name, suffix, |name| {
        graph.mixes.values().any(|m| m.name == name)
    });

    let new_id = copy.id;
    ensure_free(graph, EntityRef::Mix(new_id))?;
    reregister_parameters(graph, ids, &mut copy, suffix)?;
    graph.add_mix(copy)?;
    tracing::debug!(from = %id, to = %new_id, "mix duplicated");
    Ok(new_id)
}

/// Refuse an id already in the graph before any parameter copy is registered
fn ensure_free(graph: &EntityGraph, entity: EntityRef) -> Result<(), DuplicateError> {
    if graph.contains(entity) {
        return Err(GraphError::DuplicateId(entity).into());
    }
    Ok(())
}

fn remap_edge(
    edge: &Edge,
    vertices: &BTreeMap<Guid, Guid>,
    outputs: &BTreeMap<Guid, Guid>,
) -> Option<Edge> {
    let from = Endpoint::new(*vertices.get(&edge.from.vertex)?, edge.from.io);
    let to = if edge.to.vertex == edge.to.io {
        match outputs.get(&edge.to.vertex) {
            Some(output) => Endpoint::pathway_output(*output),
            None => Endpoint::new(*vertices.get(&edge.to.vertex)?, edge.to.io),
        }
    } else {
        Endpoint::new(*vertices.get(&edge.to.vertex)?, edge.to.io)
    };
    Some(Edge { from, to })
}

/// Give every parameter owned by `entity` a fresh copy under a new id
///
/// References to parameters missing from the table are left as they are.
fn reregister_parameters<T: RemapParameters>(
    graph: &mut EntityGraph,
    ids: &mut dyn IdGenerator,
    entity: &mut T,
    suffix: &str,
) -> Result<(), DuplicateError> {
    let table = &graph.parameters;
    let mut mapping: BTreeMap<ParameterId, ParameterId> = BTreeMap::new();
    let mut copies: Vec<Parameter> = Vec::new();

    entity.remap_parameters(&mut |id: &mut ParameterId| {
        if let Some(fresh) = mapping.get(&*id) {
            *id = fresh.clone();
            return;
        }
        let Some(original) = table.get(&*id) else {
            return;
        };
        let fresh = loop {
            let candidate = ids.next_parameter_id();
            if !table.contains(&candidate) && !copies.iter().any(|c| c.id == candidate) {
                break candidate;
            }
        };
        let mut copy = original.clone();
        copy.id = fresh.clone();
        if !copy.name.is_empty() {
            copy.name = unique_name(&original.name, suffix, |name| {
                table.get_by_name(name).is_some() || copies.iter().any(|c| c.name == name)
            });
        }
        mapping.insert(id.clone(), fresh.clone());
        copies.push(copy);
        *id = fresh;
    });

    for copy in copies {
        graph.parameters.insert(copy)?;
    }
    Ok(())
}
