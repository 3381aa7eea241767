//! Per-kind parameter discovery
//!
//! Every entity kind and every container nested inside one implements
//! [`HasParameters`], listing the parameter ids it owns and descending into
//! its children through [`ParameterVisitor::nested`]. The visitor bounds the
//! descent depth and collects each distinct parameter once.
//!
//! Only owned structure is walked: an id reference to another entity (a
//! pathway vertex, an input's source) is not followed.
//!
//! [`RemapParameters`] is the mutable counterpart used when copying an entity
//! under fresh parameter ids.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::identity::ParameterId;
use crate::entities::{
    CoProduct, EmissionFactor, EnergySource, FuelShare, Input, InputGroup, Mix, MixFeed, Mode,
    Output, Parameter, Pathway, PathwayOutput, Process, Resource, Sequestration, Technology,
    TechnologyShare, TransportStep, Treatment, Vehicle, VehicleFuel, VehicleMaterial,
};
use crate::graph::{EntityView, ParameterTable};

/// Collects the parameters reachable from an entity
#[derive(Debug)]
pub struct ParameterVisitor<'g> {
    table: &'g ParameterTable,
    max_depth: usize,
    depth: usize,
    visited: BTreeSet<ParameterId>,
    found: BTreeMap<ParameterId, &'g Parameter>,
    truncated: bool,
}

impl<'g> ParameterVisitor<'g> {
    pub fn new(table: &'g ParameterTable, max_depth: usize) -> Self {
        Self {
            table,
            max_depth,
            depth: 0,
            visited: BTreeSet::new(),
            found: BTreeMap::new(),
            truncated: false,
        }
    }

    /// Record one parameter reference; ids missing from the table are skipped
    pub fn parameter(&mut self, id: &ParameterId) {
        if !self.visited.insert(id.clone()) {
            return;
        }
        if let Some(parameter) = self.table.get(id) {
            self.found.insert(id.clone(), parameter);
        }
    }

    pub fn optional(&mut self, id: Option<&ParameterId>) {
        if let Some(id) = id {
            self.parameter(id);
        }
    }

    /// Open a nested scope; returns false when the depth bound is reached
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            if !self.truncated {
                tracing::warn!(
                    max_depth = self.max_depth,
                    "parameter discovery depth exceeded, results are partial"
                );
            }
            self.truncated = true;
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Visit a child one level deeper
    pub fn nested<T: HasParameters + ?Sized>(&mut self, item: &T) {
        if self.enter() {
            item.visit_parameters(self);
            self.leave();
        }
    }

    /// Visit every element of a child collection one level deeper
    pub fn each<'a, T: HasParameters + 'a>(&mut self, items: impl IntoIterator<Item = &'a T>) {
        if self.enter() {
            for item in items {
                self.nested(item);
            }
            self.leave();
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Parameters found, keyed by id, and whether the walk was cut short
    pub fn finish(self) -> (BTreeMap<ParameterId, &'g Parameter>, bool) {
        (self.found, self.truncated)
    }
}

/// Anything owning parameter references
pub trait HasParameters {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>);
}

impl HasParameters for Output {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.optional(self.amount.as_ref());
    }
}

impl HasParameters for TechnologyShare {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.share);
    }
}

impl HasParameters for Input {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.amount);
        v.optional(self.urban_share.as_ref());
        v.each(&self.technologies);
    }
}

impl HasParameters for CoProduct {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.nested(&self.output);
        if let Treatment::Displacement { ratio, .. } = &self.treatment {
            v.optional(ratio.as_ref());
        }
    }
}

impl HasParameters for InputGroup {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.each(&self.inputs);
    }
}

impl HasParameters for Sequestration {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.amount);
    }
}

impl HasParameters for TransportStep {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.distance);
        v.parameter(&self.share);
    }
}

impl HasParameters for EmissionFactor {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.factor);
    }
}

impl HasParameters for Process {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.nested(&self.main_output);
        v.each(&self.co_products);
        v.each(&self.inputs);
        v.each(&self.groups);
        if let Some(sequestration) = &self.sequestration {
            v.nested(sequestration);
        }
        v.each(&self.steps);
        v.each(&self.other_emissions);
    }
}

impl HasParameters for Technology {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.each(&self.emission_factors);
    }
}

impl HasParameters for Resource {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.optional(self.heating_value.as_ref());
        v.optional(self.density.as_ref());
        v.optional(self.carbon_ratio.as_ref());
    }
}

impl HasParameters for MixFeed {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.share);
    }
}

impl HasParameters for Mix {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.each(&self.feeds);
    }
}

impl HasParameters for EnergySource {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.share);
    }
}

impl HasParameters for FuelShare {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.each(&self.energy_sources);
    }
}

impl HasParameters for Mode {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.optional(self.payload.as_ref());
        v.optional(self.energy_intensity.as_ref());
        v.each(&self.fuel_shares);
    }
}

impl HasParameters for VehicleFuel {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.share);
    }
}

impl HasParameters for VehicleMaterial {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.parameter(&self.mass);
    }
}

impl HasParameters for Vehicle {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.optional(self.fuel_economy.as_ref());
        v.each(&self.fuels);
        v.each(&self.materials);
    }
}

impl HasParameters for PathwayOutput {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.optional(self.loss.as_ref());
    }
}

// Vertices name other entities by id, and those entities own their parameters.
impl HasParameters for Pathway {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        v.each(&self.outputs);
    }
}

impl HasParameters for EntityView<'_> {
    fn visit_parameters(&self, v: &mut ParameterVisitor<'_>) {
        match self {
            EntityView::Pathway(e) => e.visit_parameters(v),
            EntityView::Process(e) => e.visit_parameters(v),
            EntityView::Mix(e) => e.visit_parameters(v),
            EntityView::Resource(e) => e.visit_parameters(v),
            EntityView::Technology(e) => e.visit_parameters(v),
            EntityView::Mode(e) => e.visit_parameters(v),
            EntityView::Vehicle(e) => e.visit_parameters(v),
        }
    }
}

/// Rewrites every parameter id an entity owns
pub trait RemapParameters {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId));
}

impl<T: RemapParameters> RemapParameters for Vec<T> {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        for item in self {
            item.remap_parameters(f);
        }
    }
}

impl RemapParameters for Option<ParameterId> {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        if let Some(id) = self {
            f(id);
        }
    }
}

impl RemapParameters for Output {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        self.amount.remap_parameters(f);
    }
}

impl RemapParameters for Input {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        f(&mut self.amount);
        self.urban_share.remap_parameters(f);
        for share in &mut self.technologies {
            f(&mut share.share);
        }
    }
}

impl RemapParameters for CoProduct {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        self.output.remap_parameters(f);
        if let Treatment::Displacement { ratio, .. } = &mut self.treatment {
            ratio.remap_parameters(f);
        }
    }
}

impl RemapParameters for InputGroup {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        self.inputs.remap_parameters(f);
    }
}

impl RemapParameters for Process {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        self.main_output.remap_parameters(f);
        self.co_products.remap_parameters(f);
        self.inputs.remap_parameters(f);
        self.groups.remap_parameters(f);
        if let Some(sequestration) = &mut self.sequestration {
            f(&mut sequestration.amount);
        }
        for step in &mut self.steps {
            f(&mut step.distance);
            f(&mut step.share);
        }
        for emission in &mut self.other_emissions {
            f(&mut emission.factor);
        }
    }
}

impl RemapParameters for Mix {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        for feed in &mut self.feeds {
            f(&mut feed.share);
        }
    }
}

impl RemapParameters for Pathway {
    fn remap_parameters(&mut self, f: &mut dyn FnMut(&mut ParameterId)) {
        for output in &mut self.outputs {
            output.loss.remap_parameters(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dimension::Quantity;
    use crate::core::identity::{ProcessId, ResourceId, TechnologyId};
    use crate::entities::Source;

    fn table(ids: &[&str]) -> ParameterTable {
        ids.iter()
            .map(|id| Parameter::new(*id, Quantity::dimensionless(1.0)))
            .collect()
    }

    fn process() -> Process {
        let mut p = Process::new(ProcessId(1), "Refining", Output::new(ResourceId(5)));
        let mut input = Input::new(ResourceId(1), Source::Well, ParameterId::new("amount"));
        input.technologies.push(TechnologyShare {
            technology: TechnologyId(3),
            share: ParameterId::new("share"),
        });
        p.groups.push(InputGroup {
            name: "fuels".to_string(),
            inputs: vec![input],
        });
        p.other_emissions.push(EmissionFactor {
            pollutant: crate::core::identity::PollutantId(1),
            factor: ParameterId::new("amount"),
        });
        p
    }

    #[test]
    fn test_collects_nested_parameters_once() {
        let t = table(&["amount", "share"]);
        let mut v = ParameterVisitor::new(&t, 25);
        process().visit_parameters(&mut v);
        let (found, truncated) = v.finish();
        assert!(!truncated);
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&ParameterId::new("share")));
    }

    #[test]
    fn test_depth_bound_truncates() {
        let t = table(&["amount", "share"]);
        // groups -> group -> inputs -> input -> technologies -> share needs depth 6
        let mut v = ParameterVisitor::new(&t, 3);
        process().visit_parameters(&mut v);
        assert!(v.truncated());
        let (found, _) = v.finish();
        assert!(!found.contains_key(&ParameterId::new("share")));
    }

    #[test]
    fn test_dangling_parameter_skipped() {
        let t = table(&["share"]);
        let mut v = ParameterVisitor::new(&t, 25);
        process().visit_parameters(&mut v);
        let (found, _) = v.finish();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec![&ParameterId::new("share")]);
    }

    #[test]
    fn test_remap_rewrites_every_field() {
        let mut p = process();
        let mut seen = Vec::new();
        p.remap_parameters(&mut |id| {
            seen.push(id.clone());
            *id = ParameterId::new(format!("{}_copy", id));
        });
        assert_eq!(seen.len(), 3);
        assert_eq!(p.groups[0].inputs[0].amount, ParameterId::new("amount_copy"));
        assert_eq!(p.other_emissions[0].factor, ParameterId::new("amount_copy"));
    }

    #[test]
    fn test_pathway_owns_output_parameters_only() {
        let t = table(&["amount", "share", "loss"]);
        let mut pathway = Pathway::new(crate::core::identity::PathwayId(1), "Diesel", ResourceId(5));
        pathway.add_vertex(crate::entities::VertexModel::Process(ProcessId(1)));
        pathway.add_output(ResourceId(5));
        pathway.outputs[0].loss = Some(ParameterId::new("loss"));

        let mut v = ParameterVisitor::new(&t, 25);
        pathway.visit_parameters(&mut v);
        let (found, _) = v.finish();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec![&ParameterId::new("loss")]);
    }
}
