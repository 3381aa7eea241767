//! Resource and emission ledgers moved together

use serde::{Deserialize, Serialize};

use crate::core::dimension::{Dimension, Quantity};
use crate::ledger::quantity::LedgerError;
use crate::ledger::species::{EmissionLedger, ResourceLedger};

/// A resource ledger and an emission ledger sharing one bottom dimension
///
/// Every mutating operation validates both halves before touching either,
/// so a failed operation leaves the flow unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedFlow {
    pub resources: ResourceLedger,
    pub emissions: EmissionLedger,
}

impl CombinedFlow {
    pub fn new(bottom: Dimension) -> Self {
        Self {
            resources: ResourceLedger::new(bottom),
            emissions: EmissionLedger::new(bottom),
        }
    }

    /// Shared bottom dimension, or the disagreement between the halves
    pub fn bottom(&self) -> Result<Dimension, LedgerError> {
        let (r, e) = (self.resources.bottom(), self.emissions.bottom());
        if r != e {
            return Err(LedgerError::DimensionMismatch { left: r, right: e });
        }
        Ok(r)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.emissions.is_empty()
    }

    pub fn add(&self, other: &Self) -> Result<Self, LedgerError> {
        Ok(Self {
            resources: self.resources.add(&other.resources)?,
            emissions: self.emissions.add(&other.emissions)?,
        })
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, LedgerError> {
        self.add(&other.negate())
    }

    pub fn negate(&self) -> Self {
        Self {
            resources: self.resources.negate(),
            emissions: self.emissions.negate(),
        }
    }

    pub fn scaled(&self, s: Quantity) -> Result<Self, LedgerError> {
        Ok(Self {
            resources: self.resources.scaled(s)?,
            emissions: self.emissions.scaled(s)?,
        })
    }

    pub fn divided(&self, s: Quantity) -> Result<Self, LedgerError> {
        Ok(Self {
            resources: self.resources.divided(s)?,
            emissions: self.emissions.divided(s)?,
        })
    }

    /// In-place `self += other`, atomic across both ledgers
    pub fn addition(&mut self, other: &Self) -> Result<(), LedgerError> {
        self.check_addition(other)?;
        self.resources.addition(&other.resources)?;
        self.emissions.addition(&other.emissions)
    }

    /// In-place `self += other * s`, atomic across both ledgers
    pub fn mul_add(&mut self, other: &Self, s: Quantity) -> Result<(), LedgerError> {
        self.check_mul_add(other, s)?;
        self.resources.mul_add(&other.resources, s)?;
        self.emissions.mul_add(&other.emissions, s)
    }

    pub fn scale(&mut self, s: Quantity) -> Result<(), LedgerError> {
        self.check_scale(s)?;
        self.resources.scale(s)?;
        self.emissions.scale(s)
    }

    pub fn divide(&mut self, s: Quantity) -> Result<(), LedgerError> {
        self.check_divide(s)?;
        self.resources.divide(s)?;
        self.emissions.divide(s)
    }

    pub(crate) fn check_addition(&self, other: &Self) -> Result<(), LedgerError> {
        self.resources.check_addition(&other.resources)?;
        self.emissions.check_addition(&other.emissions)
    }

    pub(crate) fn check_mul_add(&self, other: &Self, s: Quantity) -> Result<(), LedgerError> {
        self.resources.check_mul_add(&other.resources, s)?;
        self.emissions.check_mul_add(&other.emissions, s)
    }

    pub(crate) fn check_scale(&self, s: Quantity) -> Result<(), LedgerError> {
        self.resources.scaled_bottom(s)?;
        self.emissions.scaled_bottom(s)?;
        Ok(())
    }

    pub(crate) fn check_divide(&self, s: Quantity) -> Result<(), LedgerError> {
        self.resources.divided_bottom(s)?;
        self.emissions.divided_bottom(s)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{PollutantId, ResourceId};

    fn flow(bottom: Dimension, energy: f64, co2: f64) -> CombinedFlow {
        let mut f = CombinedFlow::new(bottom);
        f.resources
            .accumulate(ResourceId(1), Quantity::new(energy, Dimension::ENERGY))
            .unwrap();
        f.emissions
            .accumulate(PollutantId(1), Quantity::new(co2, Dimension::MASS))
            .unwrap();
        f
    }

    #[test]
    fn test_addition_is_atomic() {
        let mut a = flow(Dimension::DIMENSIONLESS, 10.0, 1.0);
        let mut b = flow(Dimension::DIMENSIONLESS, 5.0, 2.0);
        b.emissions = EmissionLedger::new(Dimension::DISTANCE);
        let before = a.clone();

        assert!(a.addition(&b).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn test_mul_add_is_atomic_in_place() {
        let mut a = flow(Dimension::DIMENSIONLESS, 10.0, 1.0);
        let mut b = flow(Dimension::DISTANCE, 5.0, 2.0);
        b.emissions = EmissionLedger::from_entries(
            Dimension::DISTANCE,
            [(PollutantId(1), Quantity::new(1.0, Dimension::ENERGY))],
        )
        .unwrap();
        let before = a.clone();
        let km = Quantity::new(3.0, Dimension::DISTANCE);
        assert!(matches!(
            a.mul_add(&b, km),
            Err(LedgerError::EntryDimensionMismatch { .. })
        ));
        assert_eq!(a, before);

        let c = flow(Dimension::DISTANCE, 5.0, 2.0);
        a.mul_add(&c, km).unwrap();
        assert_eq!(a.resources.get(ResourceId(1)).unwrap().value, 25.0);
        assert_eq!(a.emissions.get(PollutantId(1)).unwrap().value, 7.0);
    }

    #[test]
    fn test_divide_overflow_leaves_flow_unchanged() {
        let mut a = flow(Dimension::DIMENSIONLESS, 10.0, 1.0);
        // resources can be divided, emissions cannot
        a.emissions = EmissionLedger::new(Dimension::new(0, 0, 0, 0, i8::MAX));
        let before = a.clone();
        assert!(a.divide(Quantity::new(2.0, Dimension::CURRENCY)).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn test_scaled_flow_shares_bottom() {
        let a = flow(Dimension::DISTANCE, 2.0, 0.1);
        let total = a.scaled(Quantity::new(50.0, Dimension::DISTANCE)).unwrap();
        assert_eq!(total.bottom().unwrap(), Dimension::DIMENSIONLESS);
        assert_eq!(total.resources.get(ResourceId(1)).unwrap().value, 100.0);
    }

    #[test]
    fn test_bottom_reports_disagreement() {
        let mut a = flow(Dimension::DIMENSIONLESS, 1.0, 1.0);
        a.resources = ResourceLedger::new(Dimension::MASS);
        assert!(a.bottom().is_err());
    }
}
