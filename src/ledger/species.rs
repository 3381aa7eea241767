//! Resource and pollutant ledgers with group rollups
//!
//! Group membership is declared per species and per group (a group may list
//! parent groups). A pollutant with a nonzero 100-year global warming
//! potential is an implicit member of the greenhouse-gas group even when it
//! does not list it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::dimension::Quantity;
use crate::core::identity::{GroupId, PollutantId, ResourceId};
use crate::ledger::quantity::{LedgerError, QuantityLedger, SpeciesKey};

/// Ledger keyed by resource
pub type ResourceLedger = QuantityLedger<ResourceId>;

/// Ledger keyed by pollutant
pub type EmissionLedger = QuantityLedger<PollutantId>;

/// Ledger keyed by resource or pollutant group
pub type GroupLedger = QuantityLedger<GroupId>;

/// A pollutant species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pollutant {
    pub id: PollutantId,

    pub name: String,

    /// 100-year global warming potential relative to CO2
    #[serde(default)]
    pub gwp100: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupId>,
}

/// A named group of resources or pollutants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesGroup {
    pub id: GroupId,

    pub name: String,

    /// Groups this group rolls up into
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<GroupId>,

    /// Marks the greenhouse-gas group
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub greenhouse: bool,
}

/// Membership tables used by group rollups
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    groups: BTreeMap<GroupId, SpeciesGroup>,
    resources: BTreeMap<ResourceId, Vec<GroupId>>,
    pollutants: BTreeMap<PollutantId, Pollutant>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: SpeciesGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn add_resource(&mut self, id: ResourceId, groups: Vec<GroupId>) {
        self.resources.insert(id, groups);
    }

    pub fn add_pollutant(&mut self, pollutant: Pollutant) {
        self.pollutants.insert(pollutant.id, pollutant);
    }

    pub fn pollutant(&self, id: PollutantId) -> Option<&Pollutant> {
        self.pollutants.get(&id)
    }

    /// The group flagged as greenhouse gases, if any
    pub fn greenhouse_group(&self) -> Option<GroupId> {
        self.groups.values().find(|g| g.greenhouse).map(|g| g.id)
    }

    /// Every group a pollutant belongs to, parents included
    pub fn pollutant_groups(&self, id: PollutantId) -> BTreeSet<GroupId> {
        let Some(pollutant) = self.pollutants.get(&id) else {
            return BTreeSet::new();
        };
        let mut seeds = pollutant.groups.clone();
        if pollutant.gwp100 != 0.0 {
            if let Some(ghg) = self.greenhouse_group() {
                seeds.push(ghg);
            }
        }
        self.with_parents(seeds)
    }

    /// Every group a resource belongs to, parents included
    pub fn resource_groups(&self, id: ResourceId) -> BTreeSet<GroupId> {
        match self.resources.get(&id) {
            Some(groups) => self.with_parents(groups.clone()),
            None => BTreeSet::new(),
        }
    }

    /// Close a set of groups over their declared parents
    fn with_parents(&self, seeds: Vec<GroupId>) -> BTreeSet<GroupId> {
        let mut members = BTreeSet::new();
        let mut pending = seeds;
        while let Some(group) = pending.pop() {
            if !members.insert(group) {
                continue;
            }
            if let Some(declared) = self.groups.get(&group) {
                pending.extend(declared.parents.iter().copied());
            }
        }
        members
    }
}

fn rollup<K: SpeciesKey>(
    ledger: &QuantityLedger<K>,
    membership: impl Fn(K) -> BTreeSet<GroupId>,
) -> Result<GroupLedger, LedgerError> {
    let mut grouped = GroupLedger::new(ledger.bottom());
    for (key, value) in ledger.iter() {
        for group in membership(key) {
            grouped.accumulate(group, value)?;
        }
    }
    Ok(grouped)
}

impl EmissionLedger {
    /// Re-key emissions by pollutant group
    pub fn group_rollup(&self, table: &SpeciesTable) -> Result<GroupLedger, LedgerError> {
        rollup(self, |p| table.pollutant_groups(p))
    }

    /// GWP100-weighted sum of every pollutant with a known potential
    pub fn co2_equivalent(&self, table: &SpeciesTable) -> Result<Option<Quantity>, LedgerError> {
        let mut total: Option<Quantity> = None;
        for (id, value) in self.iter() {
            let gwp = table.pollutant(id).map_or(0.0, |p| p.gwp100);
            if gwp == 0.0 {
                continue;
            }
            let weighted = value * gwp;
            total = Some(match total {
                None => weighted,
                Some(sum) => sum.checked_add(weighted).map_err(|source| {
                    LedgerError::EntryDimensionMismatch {
                        key: id.to_string(),
                        source,
                    }
                })?,
            });
        }
        Ok(total)
    }
}

impl ResourceLedger {
    /// Re-key resource use by resource group
    pub fn group_rollup(&self, table: &SpeciesTable) -> Result<GroupLedger, LedgerError> {
        rollup(self, |r| table.resource_groups(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dimension::Dimension;

    const GHG: GroupId = GroupId(1);
    const CRITERIA: GroupId = GroupId(2);
    const ALL: GroupId = GroupId(3);

    fn table() -> SpeciesTable {
        let mut t = SpeciesTable::new();
        t.add_group(SpeciesGroup {
            id: GHG,
            name: "GHG".to_string(),
            parents: vec![ALL],
            greenhouse: true,
        });
        t.add_group(SpeciesGroup {
            id: CRITERIA,
            name: "Criteria".to_string(),
            parents: vec![ALL],
            greenhouse: false,
        });
        t.add_group(SpeciesGroup {
            id: ALL,
            name: "All".to_string(),
            parents: vec![],
            greenhouse: false,
        });
        // CO2 declares GHG explicitly, CH4 only through its GWP
        t.add_pollutant(Pollutant {
            id: PollutantId(1),
            name: "CO2".to_string(),
            gwp100: 1.0,
            groups: vec![GHG],
        });
        t.add_pollutant(Pollutant {
            id: PollutantId(2),
            name: "CH4".to_string(),
            gwp100: 29.8,
            groups: vec![],
        });
        t.add_pollutant(Pollutant {
            id: PollutantId(3),
            name: "NOx".to_string(),
            gwp100: 0.0,
            groups: vec![CRITERIA],
        });
        t
    }

    fn grams(v: f64) -> Quantity {
        Quantity::new(v, Dimension::MASS)
    }

    #[test]
    fn test_implicit_ghg_membership() {
        let t = table();
        let groups = t.pollutant_groups(PollutantId(2));
        assert!(groups.contains(&GHG));
        assert!(groups.contains(&ALL));
        assert!(!groups.contains(&CRITERIA));
    }

    #[test]
    fn test_rollup_without_double_counting() {
        let t = table();
        let ledger = EmissionLedger::from_entries(
            Dimension::DIMENSIONLESS,
            [
                (PollutantId(1), grams(100.0)),
                (PollutantId(2), grams(2.0)),
                (PollutantId(3), grams(0.5)),
            ],
        )
        .unwrap();

        let grouped = ledger.group_rollup(&t).unwrap();
        assert_eq!(grouped.get(GHG), Some(grams(102.0)));
        assert_eq!(grouped.get(CRITERIA), Some(grams(0.5)));
        // reached from both GHG and Criteria, but each species counted once
        assert_eq!(grouped.get(ALL), Some(grams(102.5)));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut t = SpeciesTable::new();
        t.add_group(SpeciesGroup {
            id: GroupId(10),
            name: "a".to_string(),
            parents: vec![GroupId(11)],
            greenhouse: false,
        });
        t.add_group(SpeciesGroup {
            id: GroupId(11),
            name: "b".to_string(),
            parents: vec![GroupId(10)],
            greenhouse: false,
        });
        t.add_resource(ResourceId(1), vec![GroupId(10)]);
        let groups = t.resource_groups(ResourceId(1));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_co2_equivalent() {
        let t = table();
        let ledger = EmissionLedger::from_entries(
            Dimension::DIMENSIONLESS,
            [
                (PollutantId(1), grams(100.0)),
                (PollutantId(2), grams(1.0)),
                (PollutantId(3), grams(50.0)),
            ],
        )
        .unwrap();
        let co2e = ledger.co2_equivalent(&t).unwrap().unwrap();
        assert!((co2e.value - 129.8).abs() < 1e-9);
        assert_eq!(co2e.dim, Dimension::MASS);
    }

    #[test]
    fn test_resource_rollup() {
        let mut t = table();
        t.add_resource(ResourceId(7), vec![ALL]);
        let ledger = ResourceLedger::from_entries(
            Dimension::DISTANCE,
            [(ResourceId(7), Quantity::new(3.0, Dimension::ENERGY))],
        )
        .unwrap();
        let grouped = ledger.group_rollup(&t).unwrap();
        assert_eq!(grouped.bottom(), Dimension::DISTANCE);
        assert_eq!(grouped.get(ALL).unwrap().value, 3.0);
    }
}
