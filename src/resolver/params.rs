//! Parameter reference index
//!
//! Built fresh for one entity on every query; nothing is cached between calls.

use std::collections::BTreeMap;

use crate::core::identity::{EntityRef, ParameterId};
use crate::entities::Parameter;
use crate::graph::{EntityGraph, EntityView};
use crate::resolver::visit::{HasParameters, ParameterVisitor};

/// Every parameter reachable from one entity
#[derive(Debug, Clone)]
pub struct ParameterReferenceIndex<'g> {
    owner: EntityRef,
    params: BTreeMap<ParameterId, &'g Parameter>,
    truncated: bool,
}

impl<'g> ParameterReferenceIndex<'g> {
    /// Walk `entity` and collect the parameters it owns
    pub fn build(graph: &'g EntityGraph, entity: EntityView<'_>, max_depth: usize) -> Self {
        let mut visitor = ParameterVisitor::new(&graph.parameters, max_depth);
        entity.visit_parameters(&mut visitor);
        let (params, truncated) = visitor.finish();
        if truncated {
            tracing::warn!(entity = %entity.entity_ref(), "parameter index truncated");
        }
        Self {
            owner: entity.entity_ref(),
            params,
            truncated,
        }
    }

    /// Index for an entity by reference; `None` when it is not in the graph
    pub fn for_ref(graph: &'g EntityGraph, entity: EntityRef, max_depth: usize) -> Option<Self> {
        graph
            .entity(entity)
            .map(|view| Self::build(graph, view, max_depth))
    }

    pub fn owner(&self) -> EntityRef {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, id: &ParameterId) -> bool {
        self.params.contains_key(id)
    }

    pub fn get(&self, id: &ParameterId) -> Option<&'g Parameter> {
        self.params.get(id).copied()
    }

    pub fn params(&self) -> impl Iterator<Item = &'g Parameter> + '_ {
        self.params.values().copied()
    }

    /// Owned parameters carrying a formula
    pub fn formulas(&self) -> impl Iterator<Item = &'g Parameter> + '_ {
        self.params().filter(|p| p.has_formula())
    }

    /// Whether the depth bound cut discovery short
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Whether `formula` mentions `candidate` as `[id]` or `[name]`
    pub fn references(formula: &Parameter, candidate: &Parameter) -> bool {
        formula.references(candidate)
    }

    /// Whether `formula` mentions any parameter of this index
    pub fn is_referenced_by(&self, formula: &Parameter) -> bool {
        self.params().any(|p| formula.references(p))
    }
}
