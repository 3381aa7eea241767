//! Result bundle of a computed graph node
//!
//! Slots are updated independently while a node is being calculated, so the
//! bundle does not insist on a common bottom dimension after each step. The
//! agreement is checked when [`ResultBundle::bottom_dimension`] is read.

use serde::{Deserialize, Serialize};

use crate::core::dimension::{Dimension, Quantity};
use crate::ledger::combined::CombinedFlow;
use crate::ledger::quantity::LedgerError;
use crate::ledger::species::EmissionLedger;

/// Flows produced by one process, pathway or mix
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Flows occurring at the node itself
    pub onsite: CombinedFlow,

    /// Cumulative flows of everything feeding the node
    pub upstream: CombinedFlow,

    /// Emissions from product losses (evaporation, leaks)
    pub losses: EmissionLedger,

    /// Emissions not tied to energy use
    pub static_emissions: EmissionLedger,

    /// Urban subset of the on-site emissions
    pub onsite_urban: EmissionLedger,

    /// Urban subset of the upstream emissions
    pub upstream_urban: EmissionLedger,
}

macro_rules! each_slot {
    ($bundle:expr, |$flow:ident| $on_flow:expr, |$ledger:ident| $on_ledger:expr) => {{
        {
            let $flow = &mut $bundle.onsite;
            $on_flow;
        }
        {
            let $flow = &mut $bundle.upstream;
            $on_flow;
        }
        for $ledger in [
            &mut $bundle.losses,
            &mut $bundle.static_emissions,
            &mut $bundle.onsite_urban,
            &mut $bundle.upstream_urban,
        ] {
            $on_ledger;
        }
    }};
}

impl ResultBundle {
    pub fn new(bottom: Dimension) -> Self {
        Self {
            onsite: CombinedFlow::new(bottom),
            upstream: CombinedFlow::new(bottom),
            losses: EmissionLedger::new(bottom),
            static_emissions: EmissionLedger::new(bottom),
            onsite_urban: EmissionLedger::new(bottom),
            upstream_urban: EmissionLedger::new(bottom),
        }
    }

    /// Bottom dimension shared by every slot
    ///
    /// Fails with [`LedgerError::SlotMismatch`] naming the first slot that
    /// disagrees with the on-site resources.
    pub fn bottom_dimension(&self) -> Result<Dimension, LedgerError> {
        let expected = self.onsite.resources.bottom();
        let slots = [
            ("onsite.emissions", self.onsite.emissions.bottom()),
            ("upstream.resources", self.upstream.resources.bottom()),
            ("upstream.emissions", self.upstream.emissions.bottom()),
            ("losses", self.losses.bottom()),
            ("static_emissions", self.static_emissions.bottom()),
            ("onsite_urban", self.onsite_urban.bottom()),
            ("upstream_urban", self.upstream_urban.bottom()),
        ];
        for (slot, found) in slots {
            if found != expected {
                return Err(LedgerError::SlotMismatch {
                    slot,
                    expected,
                    found,
                });
            }
        }
        Ok(expected)
    }

    /// On-site plus upstream flows
    pub fn life_cycle(&self) -> Result<CombinedFlow, LedgerError> {
        self.onsite.add(&self.upstream)
    }

    /// Total emissions: life cycle plus losses and static emissions
    pub fn total_emissions(&self) -> Result<EmissionLedger, LedgerError> {
        self.onsite
            .emissions
            .add(&self.upstream.emissions)?
            .add(&self.losses)?
            .add(&self.static_emissions)
    }

    pub fn add(&self, other: &Self) -> Result<Self, LedgerError> {
        let mut sum = self.clone();
        sum.addition(other)?;
        Ok(sum)
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, LedgerError> {
        self.add(&other.negate())
    }

    pub fn negate(&self) -> Self {
        Self {
            onsite: self.onsite.negate(),
            upstream: self.upstream.negate(),
            losses: self.losses.negate(),
            static_emissions: self.static_emissions.negate(),
            onsite_urban: self.onsite_urban.negate(),
            upstream_urban: self.upstream_urban.negate(),
        }
    }

    pub fn scaled(&self, s: Quantity) -> Result<Self, LedgerError> {
        let mut out = self.clone();
        out.scale(s)?;
        Ok(out)
    }

    pub fn divided(&self, s: Quantity) -> Result<Self, LedgerError> {
        let mut out = self.clone();
        out.divide(s)?;
        Ok(out)
    }

    /// In-place slot-wise `self += other`; atomic over the whole bundle
    pub fn addition(&mut self, other: &Self) -> Result<(), LedgerError> {
        self.onsite.check_addition(&other.onsite)?;
        self.upstream.check_addition(&other.upstream)?;
        for (mine, theirs) in self.emission_slots().into_iter().zip(other.emission_slots()) {
            mine.check_addition(theirs)?;
        }
        self.onsite.addition(&other.onsite)?;
        self.upstream.addition(&other.upstream)?;
        self.losses.addition(&other.losses)?;
        self.static_emissions.addition(&other.static_emissions)?;
        self.onsite_urban.addition(&other.onsite_urban)?;
        self.upstream_urban.addition(&other.upstream_urban)
    }

    /// In-place slot-wise `self += other * s`; atomic over the whole bundle
    pub fn mul_add(&mut self, other: &Self, s: Quantity) -> Result<(), LedgerError> {
        self.onsite.check_mul_add(&other.onsite, s)?;
        self.upstream.check_mul_add(&other.upstream, s)?;
        for (mine, theirs) in self.emission_slots().into_iter().zip(other.emission_slots()) {
            mine.check_mul_add(theirs, s)?;
        }
        self.onsite.mul_add(&other.onsite, s)?;
        self.upstream.mul_add(&other.upstream, s)?;
        self.losses.mul_add(&other.losses, s)?;
        self.static_emissions.mul_add(&other.static_emissions, s)?;
        self.onsite_urban.mul_add(&other.onsite_urban, s)?;
        self.upstream_urban.mul_add(&other.upstream_urban, s)
    }

    pub fn scale(&mut self, s: Quantity) -> Result<(), LedgerError> {
        self.onsite.check_scale(s)?;
        self.upstream.check_scale(s)?;
        for ledger in self.emission_slots() {
            ledger.scaled_bottom(s)?;
        }
        each_slot!(self, |flow| flow.scale(s)?, |ledger| ledger.scale(s)?);
        Ok(())
    }

    pub fn divide(&mut self, s: Quantity) -> Result<(), LedgerError> {
        self.onsite.check_divide(s)?;
        self.upstream.check_divide(s)?;
        for ledger in self.emission_slots() {
            ledger.divided_bottom(s)?;
        }
        each_slot!(self, |flow| flow.divide(s)?, |ledger| ledger.divide(s)?);
        Ok(())
    }

    fn emission_slots(&self) -> [&EmissionLedger; 4] {
        [
            &self.losses,
            &self.static_emissions,
            &self.onsite_urban,
            &self.upstream_urban,
        ]
    }
}
