//! Library-level tests for dependency queries, duplication and ledger algebra

use approx::assert_relative_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

use lcag::core::dimension::{Dimension, Quantity};
use lcag::core::identity::{
    EntityKind, EntityRef, MixId, PathwayId, PollutantId, ProcessId, ResourceId, TechnologyId,
    VehicleId,
};
use lcag::core::SequentialIds;
use lcag::duplicate::duplicate;
use lcag::entities::{
    EmissionFactor, Input, Mix, Output, Parameter, Pathway, Process, Resource, Source,
    Technology, Vehicle, VehicleFuel, VertexModel,
};
use lcag::graph::EntityGraph;
use lcag::ledger::{EmissionLedger, LedgerError, ResourceLedger, ResultBundle};
use lcag::resolver::{DependencyResolver, ResolveOptions, ScanMode, ShareFilter};

fn param(id: &str, value: f64) -> Parameter {
    Parameter::new(id, Quantity::dimensionless(value))
}

/// Diesel pathway P1 feeding mix M1, used by vehicle V1 and wrapped by pathway P2
fn fuel_graph() -> EntityGraph {
    let mut g = EntityGraph::new();
    g.add_resource(Resource::new(ResourceId(1), "Diesel")).unwrap();
    g.add_pathway(Pathway::new(PathwayId(1), "P1", ResourceId(1))).unwrap();

    let mut m1 = Mix::new(MixId(1), "M1", ResourceId(1));
    m1.add_pathway_feed(PathwayId(1), None, "share_p1".into());
    g.add_mix(m1).unwrap();
    g.add_parameter(param("share_p1", 0.3)).unwrap();

    let mut v1 = Vehicle::new(VehicleId(1), "V1");
    v1.fuels.push(VehicleFuel {
        resource: ResourceId(1),
        source: Source::Mix { mix: MixId(1) },
        share: "fuel_share".into(),
    });
    g.add_vehicle(v1).unwrap();
    g.add_parameter(param("fuel_share", 1.0)).unwrap();

    let mut p2 = Pathway::new(PathwayId(2), "P2", ResourceId(1));
    p2.add_vertex(VertexModel::Mix(MixId(1)));
    g.add_pathway(p2).unwrap();
    g
}

#[test]
fn pathway_used_by_mix_only() {
    let g = fuel_graph();
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    let found = resolver.find_dependents(EntityRef::Pathway(PathwayId(1)));
    assert_eq!(found, BTreeSet::from([EntityRef::Mix(MixId(1))]));
}

#[test]
fn mix_used_by_vehicle_and_pathway() {
    let g = fuel_graph();
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    let found = resolver.find_dependents(EntityRef::Mix(MixId(1)));
    assert_eq!(
        found,
        BTreeSet::from([
            EntityRef::Pathway(PathwayId(2)),
            EntityRef::Vehicle(VehicleId(1)),
        ])
    );

    let options = ResolveOptions {
        exclude_vehicles: true,
        ..ResolveOptions::default()
    };
    let found = DependencyResolver::new(&g, options).find_dependents(EntityRef::Mix(MixId(1)));
    assert_eq!(found, BTreeSet::from([EntityRef::Pathway(PathwayId(2))]));
}

#[test]
fn discarding_the_only_consumer_makes_supplier_unused() {
    let mut g = fuel_graph();
    g.discard(EntityRef::Mix(MixId(1))).unwrap();
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());

    assert!(!resolver.has_dependents(EntityRef::Pathway(PathwayId(1))));
    assert!(resolver
        .unused_ids(EntityKind::Pathway)
        .contains(&EntityRef::Pathway(PathwayId(1))));

    let with_discarded = ResolveOptions {
        include_discarded: true,
        ..ResolveOptions::default()
    };
    assert!(DependencyResolver::new(&g, with_discarded).has_dependents(EntityRef::Pathway(PathwayId(1))));
}

#[test]
fn mix_feeding_on_main_output_is_the_only_dependent() {
    let mut g = EntityGraph::new();
    g.add_resource(Resource::new(ResourceId(1), "Diesel")).unwrap();

    let mut p1 = Pathway::new(PathwayId(10), "P1", ResourceId(1));
    let o1 = p1.add_output(ResourceId(1));
    p1.set_main_output(o1).unwrap();
    g.add_pathway(p1).unwrap();

    let mut m1 = Mix::new(MixId(20), "M1", ResourceId(1));
    m1.add_pathway_feed(PathwayId(10), Some(o1), "share_p1".into());
    g.add_mix(m1).unwrap();
    g.add_parameter(param("share_p1", 0.3)).unwrap();

    let p1 = EntityRef::Pathway(PathwayId(10));
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    assert_eq!(
        resolver.find_dependents(p1),
        BTreeSet::from([EntityRef::Mix(MixId(20))])
    );
    assert_eq!(resolver.used_ids(EntityKind::Pathway), vec![p1]);

    g.discard(EntityRef::Mix(MixId(20))).unwrap();
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    assert!(!resolver.used_ids(EntityKind::Pathway).contains(&p1));
    assert!(resolver.unused_ids(EntityKind::Pathway).contains(&p1));
}

#[test]
fn zero_share_feed_filtered_by_year() {
    let mut g = fuel_graph();
    let mut series = std::collections::BTreeMap::new();
    series.insert(2020, Quantity::dimensionless(0.0));
    series.insert(2030, Quantity::dimensionless(0.5));
    let share = g.parameters.remove(&"share_p1".into()).unwrap();
    g.add_parameter(Parameter {
        value: lcag::entities::ParameterValue::Series(series),
        ..share
    })
    .unwrap();

    let target = EntityRef::Pathway(PathwayId(1));
    let in_year = |year| ResolveOptions {
        share_filter: ShareFilter::NonZeroIn(year),
        ..ResolveOptions::default()
    };
    assert!(!DependencyResolver::new(&g, in_year(2025)).has_dependents(target));
    assert!(DependencyResolver::new(&g, in_year(2030)).has_dependents(target));

    let somewhere = ResolveOptions {
        share_filter: ShareFilter::NonZeroSomewhere,
        ..ResolveOptions::default()
    };
    assert!(DependencyResolver::new(&g, somewhere).has_dependents(target));
}

#[test]
fn technology_found_through_formula_only() {
    let mut g = EntityGraph::new();
    g.add_resource(Resource::new(ResourceId(1), "Natural gas")).unwrap();

    let mut turbine = Technology::new(TechnologyId(4), "Gas turbine", ResourceId(1));
    turbine.emission_factors.push(EmissionFactor {
        pollutant: PollutantId(1),
        factor: "ef_ch4".into(),
    });
    g.add_technology(turbine).unwrap();
    g.add_parameter(param("ef_ch4", 0.02).with_name("Turbine CH4")).unwrap();

    let mut boiler = Process::new(ProcessId(9), "Boiler", Output::new(ResourceId(1)));
    boiler
        .inputs
        .push(Input::new(ResourceId(1), Source::Well, "fuel_use".into()));
    g.add_process(boiler).unwrap();
    g.add_parameter(
        Parameter::new("fuel_use", Quantity::default()).with_formula("[Turbine CH4] * 40"),
    )
    .unwrap();

    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    let target = EntityRef::Technology(TechnologyId(4));
    assert_eq!(
        resolver.find_dependents(target),
        BTreeSet::from([EntityRef::Process(ProcessId(9))])
    );

    let first: Vec<_> = resolver.dependents(target, ScanMode::FirstHit).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].relation.as_str(), "formula");
}

#[test]
fn parallel_and_serial_formula_scans_agree() {
    let mut g = EntityGraph::new();
    g.add_resource(Resource::new(ResourceId(1), "Electricity")).unwrap();
    let mut source = Process::new(ProcessId(1), "Grid", Output::new(ResourceId(1)));
    source.main_output.amount = Some("grid_out".into());
    g.add_process(source).unwrap();
    g.add_parameter(param("grid_out", 1.0)).unwrap();

    for i in 0..40 {
        let pid = format!("use_{}", i);
        let mut p = Process::new(ProcessId(100 + i), format!("User {}", i), Output::new(ResourceId(1)));
        p.inputs.push(Input::new(ResourceId(1), Source::Well, pid.as_str().into()));
        g.add_process(p).unwrap();
        let formula = if i % 3 == 0 { "[grid_out] * 2" } else { "3" };
        g.add_parameter(Parameter::new(pid, Quantity::default()).with_formula(formula))
            .unwrap();
    }

    let target = EntityRef::Process(ProcessId(1));
    let serial = DependencyResolver::new(
        &g,
        ResolveOptions {
            parallel_threshold: usize::MAX,
            ..ResolveOptions::default()
        },
    )
    .find_dependents(target);
    let parallel = DependencyResolver::new(
        &g,
        ResolveOptions {
            parallel_threshold: 1,
            ..ResolveOptions::default()
        },
    )
    .find_dependents(target);

    assert_eq!(serial.len(), 14);
    assert_eq!(serial, parallel);
}

#[test]
fn usage_partitions_every_kind() {
    let mut g = fuel_graph();
    g.add_pathway(Pathway::new(PathwayId(3), "P3", ResourceId(1))).unwrap();
    g.discard(EntityRef::Pathway(PathwayId(3))).unwrap();
    let resolver = DependencyResolver::new(&g, ResolveOptions::default());

    for kind in EntityKind::all() {
        let report = resolver.usage(*kind);
        let mut all: Vec<EntityRef> = report
            .used
            .iter()
            .chain(&report.unused)
            .chain(&report.discarded)
            .copied()
            .collect();
        all.sort();
        assert_eq!(all, g.refs(*kind), "partition of {}", kind);
        let unique: BTreeSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}

#[test]
fn duplicated_mix_has_same_dependencies_on_suppliers() {
    let mut g = fuel_graph();
    let mut ids = SequentialIds::from_graph(&g);
    let copy = duplicate(&mut g, &mut ids, EntityRef::Mix(MixId(1)), " - Copy").unwrap();

    assert_eq!(copy, EntityRef::Mix(MixId(2)));
    assert_eq!(g.name_of(copy), Some("M1 - Copy"));

    let resolver = DependencyResolver::new(&g, ResolveOptions::default());
    let found = resolver.find_dependents(EntityRef::Pathway(PathwayId(1)));
    assert_eq!(found, BTreeSet::from([EntityRef::Mix(MixId(1)), copy]));
    // the copy is unused until something draws from it
    assert!(!resolver.has_dependents(copy));
}

#[test]
fn mismatched_bundle_slots_are_reported() {
    let per_energy = Dimension::ENERGY;
    let mut bundle = ResultBundle::new(per_energy);
    assert_eq!(bundle.bottom_dimension().unwrap(), per_energy);

    bundle.losses = EmissionLedger::new(Dimension::MASS);
    match bundle.bottom_dimension() {
        Err(LedgerError::SlotMismatch { slot, expected, found }) => {
            assert_eq!(slot, "losses");
            assert_eq!(expected, per_energy);
            assert_eq!(found, Dimension::MASS);
        }
        other => panic!("expected slot mismatch, got {:?}", other),
    }
}

#[test]
fn adding_ledgers_with_different_bottoms_fails_without_change() {
    let mut per_unit = ResourceLedger::new(Dimension::DIMENSIONLESS);
    per_unit.set(ResourceId(1), Quantity::new(10.0, Dimension::ENERGY));
    let mut per_distance = ResourceLedger::new(Dimension::DISTANCE);
    per_distance.set(ResourceId(1), Quantity::new(5.0, Dimension::ENERGY));

    let before = per_unit.clone();
    assert!(matches!(
        per_unit.add(&per_distance),
        Err(LedgerError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        per_unit.addition(&per_distance),
        Err(LedgerError::DimensionMismatch { .. })
    ));
    assert_eq!(per_unit, before);
}

fn ledger_strategy() -> impl Strategy<Value = EmissionLedger> {
    proptest::collection::btree_map(0i32..6, -1.0e6f64..1.0e6, 0..6).prop_map(|entries| {
        EmissionLedger::from_entries(
            Dimension::ENERGY,
            entries
                .into_iter()
                .map(|(k, v)| (PollutantId(k), Quantity::new(v, Dimension::MASS))),
        )
        .unwrap()
    })
}

fn assert_ledgers_close(a: &EmissionLedger, b: &EmissionLedger) {
    assert_eq!(a.bottom(), b.bottom());
    let keys: BTreeSet<_> = a.keys().chain(b.keys()).collect();
    for key in keys {
        let x = a.get(key).map_or(0.0, |q| q.value);
        let y = b.get(key).map_or(0.0, |q| q.value);
        assert_relative_eq!(x, y, epsilon = 1e-6, max_relative = 1e-9);
    }
}

proptest! {
    #[test]
    fn addition_commutes(a in ledger_strategy(), b in ledger_strategy()) {
        assert_ledgers_close(&a.add(&b).unwrap(), &b.add(&a).unwrap());
    }

    #[test]
    fn addition_associates(a in ledger_strategy(), b in ledger_strategy(), c in ledger_strategy()) {
        let left = a.add(&b).unwrap().add(&c).unwrap();
        let right = a.add(&b.add(&c).unwrap()).unwrap();
        assert_ledgers_close(&left, &right);
    }

    #[test]
    fn adding_the_negation_gives_zero(a in ledger_strategy()) {
        let zero = a.add(&a.negate()).unwrap();
        prop_assert!(zero.iter().all(|(_, q)| q.value == 0.0));
        prop_assert_eq!(zero.bottom(), a.bottom());
    }

    #[test]
    fn scaling_by_one_is_identity(a in ledger_strategy()) {
        prop_assert_eq!(a.scaled(Quantity::dimensionless(1.0)).unwrap(), a);
    }

    #[test]
    fn divide_undoes_scale(a in ledger_strategy(), s in 0.001f64..1000.0) {
        let factor = Quantity::new(s, Dimension::DISTANCE);
        let scaled = a.scaled(factor).unwrap();
        prop_assert_eq!(scaled.bottom(), Dimension::ENERGY.minus(Dimension::DISTANCE));
        let back = scaled.divided(factor).unwrap();
        assert_ledgers_close(&back, &a);
    }
}
