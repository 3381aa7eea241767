//! Usage reports: which entities of a kind are referenced at all

use serde::Serialize;

use crate::core::identity::{EntityKind, EntityRef};
use crate::resolver::dependents::DependencyResolver;

/// Partition of one kind's ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub used: Vec<EntityRef>,
    pub unused: Vec<EntityRef>,
    pub discarded: Vec<EntityRef>,
}

impl DependencyResolver<'_> {
    /// Non-discarded ids of `kind` with at least one dependent
    pub fn used_ids(&self, kind: EntityKind) -> Vec<EntityRef> {
        self.live_ids(kind)
            .filter(|id| self.has_dependents(*id))
            .collect()
    }

    /// Non-discarded ids of `kind` with no dependent
    pub fn unused_ids(&self, kind: EntityKind) -> Vec<EntityRef> {
        self.live_ids(kind)
            .filter(|id| !self.has_dependents(*id))
            .collect()
    }

    /// Discarded ids of `kind`
    pub fn discarded_ids(&self, kind: EntityKind) -> Vec<EntityRef> {
        let graph = self.graph();
        graph
            .refs(kind)
            .into_iter()
            .filter(|id| graph.is_discarded(*id))
            .collect()
    }

    /// Used, unused and discarded ids of `kind` in one pass
    pub fn usage(&self, kind: EntityKind) -> UsageReport {
        let mut report = UsageReport {
            discarded: self.discarded_ids(kind),
            ..Default::default()
        };
        for id in self.live_ids(kind) {
            if self.has_dependents(id) {
                report.used.push(id);
            } else {
                report.unused.push(id);
            }
        }
        tracing::debug!(
            %kind,
            used = report.used.len(),
            unused = report.unused.len(),
            discarded = report.discarded.len(),
            "usage report"
        );
        report
    }

    fn live_ids(&self, kind: EntityKind) -> impl Iterator<Item = EntityRef> + '_ {
        let graph = self.graph();
        graph
            .refs(kind)
            .into_iter()
            .filter(move |id| !graph.is_discarded(*id))
    }
}
