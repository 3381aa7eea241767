//! Id generation for new entities and parameters

use std::collections::BTreeMap;

use crate::core::identity::{EntityKind, Guid, ParameterId};
use crate::graph::EntityGraph;

/// Source of fresh identifiers
pub trait IdGenerator {
    /// Next unused integer id for an entity kind
    fn next_id(&mut self, kind: EntityKind) -> i32;

    /// Next unused parameter key
    fn next_parameter_id(&mut self) -> ParameterId;

    /// Fresh vertex / io guid
    fn new_guid(&mut self) -> Guid {
        Guid::new()
    }
}

/// Counter-based generator seeded from the largest ids already in a graph
///
/// Parameter keys are minted as `p<n>`.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: BTreeMap<EntityKind, i32>,
    next_parameter: u64,
}

impl SequentialIds {
    pub fn from_graph(graph: &EntityGraph) -> Self {
        let next = EntityKind::all()
            .iter()
            .map(|kind| (*kind, graph.max_id(*kind) + 1))
            .collect();
        let next_parameter = graph
            .parameters
            .iter()
            .filter_map(|p| p.id.as_str().strip_prefix('p'))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        Self {
            next,
            next_parameter,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, kind: EntityKind) -> i32 {
        let slot = self.next.entry(kind).or_insert(1);
        let id = *slot;
        *slot += 1;
        id
    }

    fn next_parameter_id(&mut self) -> ParameterId {
        let n = self.next_parameter.max(1);
        self.next_parameter = n + 1;
        ParameterId::new(format!("p{}", n))
    }
}
