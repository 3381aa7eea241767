//! Formula-level dependents
//!
//! An entity depends on X at formula level when one of its own parameters
//! carries a formula naming a parameter X owns. The scan runs in two steps.
//! X's parameters are first matched against the formulas of the parameter
//! table, iterating the larger side in the outer loop. Owners are then
//! resolved only when some formula matched, by indexing eligible entities
//! until one owning a matching formula turns up (first-hit) or all have been
//! seen. Both steps fan out with rayon once their side passes the configured
//! threshold.

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::identity::{EntityRef, ParameterId};
use crate::entities::Parameter;
use crate::graph::{EntityGraph, EntityView};
use crate::resolver::dependents::{ResolveOptions, ScanMode};
use crate::resolver::params::ParameterReferenceIndex;

/// Owners of formulas referencing any parameter of `target`
pub fn formula_dependents(
    graph: &EntityGraph,
    target: EntityRef,
    options: &ResolveOptions,
    mode: ScanMode,
    eligible: impl Fn(&EntityView<'_>) -> bool,
) -> BTreeSet<EntityRef> {
    let Some(owned) = ParameterReferenceIndex::for_ref(graph, target, options.max_depth) else {
        return BTreeSet::new();
    };
    if owned.is_empty() {
        return BTreeSet::new();
    }

    let matched = matching_formulas(graph, &owned, options.parallel_threshold);
    if matched.is_empty() {
        return BTreeSet::new();
    }

    let entities: Vec<EntityView<'_>> = graph.all_entities().filter(|e| eligible(e)).collect();
    let parallel = entities.len() >= options.parallel_threshold;
    tracing::trace!(
        formulas = matched.len(),
        entities = entities.len(),
        parallel,
        "resolving formula owners"
    );
    fan_out(&entities, parallel, mode == ScanMode::FirstHit, |entity| {
        let index = ParameterReferenceIndex::build(graph, *entity, options.max_depth);
        if matched.iter().any(|id| index.contains(id)) {
            vec![entity.entity_ref()]
        } else {
            Vec::new()
        }
    })
}

/// Ids of table formulas naming a parameter in `owned`, excluding `owned`'s own
fn matching_formulas<'g>(
    graph: &'g EntityGraph,
    owned: &ParameterReferenceIndex<'g>,
    parallel_threshold: usize,
) -> BTreeSet<&'g ParameterId> {
    let targets: Vec<&Parameter> = owned.params().collect();
    let formulas: Vec<&Parameter> = graph
        .parameters
        .formulas()
        .filter(|p| !owned.contains(&p.id))
        .collect();
    if formulas.is_empty() {
        return BTreeSet::new();
    }

    let parallel = formulas.len().max(targets.len()) >= parallel_threshold;
    tracing::trace!(
        owned = targets.len(),
        formulas = formulas.len(),
        parallel,
        "formula scan"
    );

    if formulas.len() >= targets.len() {
        fan_out(&formulas, parallel, false, |&formula| {
            if targets.iter().any(|t| formula.references(t)) {
                vec![&formula.id]
            } else {
                Vec::new()
            }
        })
    } else {
        fan_out(&targets, parallel, false, |target| {
            formulas
                .iter()
                .filter(|formula| formula.references(target))
                .map(|&formula| &formula.id)
                .collect()
        })
    }
}

/// Probe every item, optionally in parallel
///
/// In first-hit mode a shared flag makes the remaining probes return empty
/// once any probe has matched.
fn fan_out<T, O, F>(items: &[T], parallel: bool, first: bool, test: F) -> BTreeSet<O>
where
    T: Sync,
    O: Ord + Send,
    F: Fn(&T) -> Vec<O> + Sync,
{
    let stop = AtomicBool::new(false);
    let probe = |item: &T| -> Vec<O> {
        if stop.load(Ordering::Relaxed) {
            return Vec::new();
        }
        let hits = test(item);
        if first && !hits.is_empty() {
            stop.store(true, Ordering::Relaxed);
        }
        hits
    };
    if parallel {
        items.par_iter().flat_map_iter(probe).collect()
    } else {
        items.iter().flat_map(probe).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_first_hit_stops_serial_scan() {
        let items: Vec<i32> = (1..=10).collect();
        let hits = fan_out(&items, false, true, |n| {
            if n % 3 == 0 {
                vec![EntityRef::new(crate::core::identity::EntityKind::Mix, *n)]
            } else {
                Vec::new()
            }
        });
        assert_eq!(hits.len(), 1);
        assert!(hits.contains(&EntityRef::new(crate::core::identity::EntityKind::Mix, 3)));
    }

    #[test]
    fn test_fan_out_all_hits_parallel() {
        let items: Vec<i32> = (1..=100).collect();
        let hits = fan_out(&items, true, false, |n| {
            if n % 10 == 0 {
                vec![EntityRef::new(crate::core::identity::EntityKind::Process, *n)]
            } else {
                Vec::new()
            }
        });
        assert_eq!(hits.len(), 10);
    }

    #[test]
    fn test_unreferenced_target_skips_owner_resolution() {
        use crate::core::dimension::Quantity;
        use crate::core::identity::{ProcessId, ResourceId};
        use crate::entities::{Input, Output, Process, Source};

        let mut g = EntityGraph::new();
        let mut source = Process::new(ProcessId(1), "Grid", Output::new(ResourceId(1)));
        source.main_output.amount = Some("grid_out".into());
        g.add_process(source).unwrap();
        g.add_parameter(Parameter::new("grid_out", Quantity::dimensionless(1.0)))
            .unwrap();
        for i in 0..6 {
            let id = format!("use_{}", i);
            let mut p = Process::new(ProcessId(10 + i), format!("User {}", i), Output::new(ResourceId(1)));
            p.inputs.push(Input::new(ResourceId(1), Source::Well, id.as_str().into()));
            g.add_process(p).unwrap();
            let formula = if i == 4 { "[grid_out] / 2" } else { "7" };
            g.add_parameter(Parameter::new(id, Quantity::default()).with_formula(formula))
                .unwrap();
        }

        let options = ResolveOptions::default();
        let target = EntityRef::Process(ProcessId(1));
        let matched = matching_formulas(
            &g,
            &ParameterReferenceIndex::for_ref(&g, target, options.max_depth).unwrap(),
            options.parallel_threshold,
        );
        assert_eq!(matched, BTreeSet::from([&ParameterId::new("use_4")]));

        let seen = std::sync::atomic::AtomicUsize::new(0);
        let found = formula_dependents(&g, target, &options, ScanMode::All, |view| {
            seen.fetch_add(1, Ordering::Relaxed);
            view.entity_ref() != target
        });
        assert_eq!(found, BTreeSet::from([EntityRef::Process(ProcessId(14))]));
        assert_eq!(seen.load(Ordering::Relaxed), 7);

        // nothing names the user's parameters, so no entity is ever inspected
        seen.store(0, Ordering::Relaxed);
        let user = EntityRef::Process(ProcessId(10));
        let found = formula_dependents(&g, user, &options, ScanMode::All, |_| {
            seen.fetch_add(1, Ordering::Relaxed);
            true
        });
        assert!(found.is_empty());
        assert_eq!(seen.load(Ordering::Relaxed), 0);
    }
}
