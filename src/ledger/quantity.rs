//! Species-keyed ledgers of dimensioned quantities
//!
//! Every entry of a [`QuantityLedger`] is expressed per unit of the ledger's
//! bottom dimension (e.g. joules of crude oil per meter driven). Two ledgers
//! can only be added when they share a bottom dimension; scaling by a
//! dimensioned scalar moves the bottom dimension instead of the entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::dimension::{Dimension, DimensionError, DimensionOverflow, Quantity};
use crate::core::identity::{GroupId, PollutantId, ResourceId};

/// Keys usable in a ledger
pub trait SpeciesKey: Copy + Ord + fmt::Debug + fmt::Display {}

impl SpeciesKey for ResourceId {}
impl SpeciesKey for PollutantId {}
impl SpeciesKey for GroupId {}

/// Errors raised by ledger arithmetic
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("dimension mismatch: bottom dimension {left} vs {right}")]
    DimensionMismatch { left: Dimension, right: Dimension },

    #[error("dimension mismatch on entry {key}: {source}")]
    EntryDimensionMismatch {
        key: String,
        #[source]
        source: DimensionError,
    },

    #[error("division by a zero-magnitude scalar")]
    DivisionByZero,

    #[error(transparent)]
    DimensionOverflow(#[from] DimensionOverflow),

    #[error("result slot '{slot}' has bottom dimension {found}, expected {expected}")]
    SlotMismatch {
        slot: &'static str,
        expected: Dimension,
        found: Dimension,
    },
}

/// Mapping from species to dimensioned scalar sharing one bottom dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityLedger<K: Ord> {
    #[serde(default)]
    bottom: Dimension,
    entries: BTreeMap<K, Quantity>,
}

impl<K: SpeciesKey> Default for QuantityLedger<K> {
    fn default() -> Self {
        Self::new(Dimension::DIMENSIONLESS)
    }
}

impl<K: SpeciesKey> QuantityLedger<K> {
    pub fn new(bottom: Dimension) -> Self {
        Self {
            bottom,
            entries: BTreeMap::new(),
        }
    }

    /// Build a ledger from entries; repeated keys are accumulated
    pub fn from_entries(
        bottom: Dimension,
        entries: impl IntoIterator<Item = (K, Quantity)>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(bottom);
        for (key, value) in entries {
            ledger.accumulate(key, value)?;
        }
        Ok(ledger)
    }

    pub fn bottom(&self) -> Dimension {
        self.bottom
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: K) -> Option<Quantity> {
        self.entries.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, Quantity)> + '_ {
        self.entries.iter().map(|(k, q)| (*k, *q))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    /// Overwrite one entry
    pub fn set(&mut self, key: K, value: Quantity) {
        self.entries.insert(key, value);
    }

    /// Add `value` to the entry for `key`, treating an absent entry as zero
    pub fn accumulate(&mut self, key: K, value: Quantity) -> Result<(), LedgerError> {
        match self.entries.get_mut(&key) {
            Some(existing) => {
                *existing = existing
                    .checked_add(value)
                    .map_err(|source| entry_mismatch(key, source))?;
            }
            None => {
                self.entries.insert(key, value);
            }
        }
        Ok(())
    }

    /// New ledger holding `self + other`
    pub fn add(&self, other: &Self) -> Result<Self, LedgerError> {
        let mut sum = self.clone();
        sum.addition(other)?;
        Ok(sum)
    }

    /// New ledger holding `self - other`
    pub fn subtract(&self, other: &Self) -> Result<Self, LedgerError> {
        self.add(&other.negate())
    }

    pub fn negate(&self) -> Self {
        Self {
            bottom: self.bottom,
            entries: self.entries.iter().map(|(k, q)| (*k, -*q)).collect(),
        }
    }

    /// New ledger with every value multiplied by `s`; the bottom loses `s`'s dimension
    pub fn scaled(&self, s: Quantity) -> Result<Self, LedgerError> {
        let mut out = self.clone();
        out.scale(s)?;
        Ok(out)
    }

    /// New ledger with every value divided by `s`; the bottom gains `s`'s dimension
    pub fn divided(&self, s: Quantity) -> Result<Self, LedgerError> {
        let mut out = self.clone();
        out.divide(s)?;
        Ok(out)
    }

    /// In-place `self += other`
    ///
    /// Either every entry is updated or, on error, none is.
    pub fn addition(&mut self, other: &Self) -> Result<(), LedgerError> {
        self.check_addition(other)?;
        self.apply_mul_add(other, 1.0);
        Ok(())
    }

    /// In-place `self += other * s`, without materializing `other * s`
    pub fn mul_add(&mut self, other: &Self, s: Quantity) -> Result<(), LedgerError> {
        self.check_mul_add(other, s)?;
        self.apply_mul_add(other, s.value);
        Ok(())
    }

    /// In-place multiplication by a scalar
    pub fn scale(&mut self, s: Quantity) -> Result<(), LedgerError> {
        let bottom = self.scaled_bottom(s)?;
        for value in self.entries.values_mut() {
            value.value *= s.value;
        }
        self.bottom = bottom;
        Ok(())
    }

    /// In-place division by a scalar; a zero-magnitude divisor is rejected
    pub fn divide(&mut self, s: Quantity) -> Result<(), LedgerError> {
        let bottom = self.divided_bottom(s)?;
        for value in self.entries.values_mut() {
            value.value /= s.value;
        }
        self.bottom = bottom;
        Ok(())
    }

    /// Sum of the entries whose own dimension is energy
    pub fn total_energy(&self) -> Quantity {
        let total = self
            .entries
            .values()
            .filter(|q| q.dim == Dimension::ENERGY)
            .map(|q| q.value)
            .sum();
        Quantity::new(total, Dimension::ENERGY)
    }

    /// Validate `self += other` without touching `self`
    pub(crate) fn check_addition(&self, other: &Self) -> Result<(), LedgerError> {
        self.check_bottom(other.bottom)?;
        self.check_entries(other.iter())
    }

    /// Validate `self += other * s` without touching `self`
    pub(crate) fn check_mul_add(&self, other: &Self, s: Quantity) -> Result<(), LedgerError> {
        self.check_bottom(other.bottom.checked_minus(s.dim)?)?;
        self.check_entries(other.iter())
    }

    /// Bottom dimension after multiplying by `s`
    pub(crate) fn scaled_bottom(&self, s: Quantity) -> Result<Dimension, LedgerError> {
        Ok(self.bottom.checked_minus(s.dim)?)
    }

    /// Bottom dimension after dividing by `s`; rejects a zero divisor
    pub(crate) fn divided_bottom(&self, s: Quantity) -> Result<Dimension, LedgerError> {
        if s.is_zero() {
            return Err(LedgerError::DivisionByZero);
        }
        Ok(self.bottom.checked_plus(s.dim)?)
    }

    fn apply_mul_add(&mut self, other: &Self, factor: f64) {
        for (key, value) in other.iter() {
            let slot = self.entries.entry(key).or_insert(Quantity::zero(value.dim));
            slot.value += value.value * factor;
        }
    }

    fn check_bottom(&self, other: Dimension) -> Result<(), LedgerError> {
        if self.bottom != other {
            return Err(LedgerError::DimensionMismatch {
                left: self.bottom,
                right: other,
            });
        }
        Ok(())
    }

    fn check_entries(&self, incoming: impl Iterator<Item = (K, Quantity)>) -> Result<(), LedgerError> {
        for (key, value) in incoming {
            if let Some(existing) = self.entries.get(&key) {
                if existing.dim != value.dim {
                    return Err(entry_mismatch(
                        key,
                        DimensionError {
                            left: existing.dim,
                            right: value.dim,
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}

fn entry_mismatch<K: fmt::Display>(key: K, source: DimensionError) -> LedgerError {
    LedgerError::EntryDimensionMismatch {
        key: key.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn joules(v: f64) -> Quantity {
        Quantity::new(v, Dimension::ENERGY)
    }

    fn ledger(bottom: Dimension, entries: &[(i32, Quantity)]) -> QuantityLedger<ResourceId> {
        QuantityLedger::from_entries(bottom, entries.iter().map(|(k, q)| (ResourceId(*k), *q)))
            .unwrap()
    }

    #[test]
    fn test_add_unions_keys() {
        let a = ledger(Dimension::DIMENSIONLESS, &[(1, joules(10.0)), (2, joules(1.0))]);
        let b = ledger(Dimension::DIMENSIONLESS, &[(1, joules(5.0)), (3, joules(2.0))]);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.get(ResourceId(1)), Some(joules(15.0)));
        assert_eq!(sum.get(ResourceId(2)), Some(joules(1.0)));
        assert_eq!(sum.get(ResourceId(3)), Some(joules(2.0)));
    }

    #[test]
    fn test_add_rejects_different_bottoms() {
        let a = ledger(Dimension::DIMENSIONLESS, &[(1, joules(10.0))]);
        let b = ledger(Dimension::DISTANCE, &[(1, joules(5.0))]);
        let err = a.add(&b).unwrap_err();
        assert_eq!(
            err,
            LedgerError::DimensionMismatch {
                left: Dimension::DIMENSIONLESS,
                right: Dimension::DISTANCE
            }
        );
    }

    #[test]
    fn test_addition_is_atomic_on_entry_mismatch() {
        let mut a = ledger(Dimension::DIMENSIONLESS, &[(1, joules(10.0)), (2, joules(1.0))]);
        let b = ledger(
            Dimension::DIMENSIONLESS,
            &[(2, joules(1.0)), (1, Quantity::new(3.0, Dimension::MASS))],
        );
        let before = a.clone();
        assert!(matches!(
            a.addition(&b),
            Err(LedgerError::EntryDimensionMismatch { .. })
        ));
        assert_eq!(a, before);
    }

    #[test]
    fn test_subtract_self_is_zero() {
        let a = ledger(Dimension::MASS, &[(1, joules(10.0)), (2, joules(-4.5))]);
        let diff = a.subtract(&a).unwrap();
        assert_eq!(diff.len(), 2);
        for (_, q) in diff.iter() {
            assert_eq!(q.value, 0.0);
        }
    }

    #[test]
    fn test_scale_moves_bottom() {
        let per_m = ledger(Dimension::DISTANCE, &[(1, joules(2.0))]);
        let total = per_m.scaled(Quantity::new(100.0, Dimension::DISTANCE)).unwrap();
        assert!(total.bottom().is_dimensionless());
        assert_eq!(total.get(ResourceId(1)), Some(joules(200.0)));
    }

    #[test]
    fn test_divide_by_zero_rejected() {
        let a = ledger(Dimension::DIMENSIONLESS, &[(1, joules(2.0))]);
        assert_eq!(
            a.divided(Quantity::new(0.0, Dimension::MASS)).unwrap_err(),
            LedgerError::DivisionByZero
        );
    }

    #[test]
    fn test_mul_add_matches_scaled_add() {
        let mut acc = ledger(Dimension::DIMENSIONLESS, &[(1, joules(1.0))]);
        let per_kg = ledger(Dimension::MASS, &[(1, joules(3.0)), (4, joules(0.5))]);
        let s = Quantity::new(2.0, Dimension::MASS);

        let expected = acc.add(&per_kg.scaled(s).unwrap()).unwrap();
        acc.mul_add(&per_kg, s).unwrap();
        assert_eq!(acc, expected);
    }

    #[test]
    fn test_mul_add_checks_scaled_bottom() {
        let mut acc = ledger(Dimension::DIMENSIONLESS, &[]);
        let per_kg = ledger(Dimension::MASS, &[(1, joules(3.0))]);
        let err = acc
            .mul_add(&per_kg, Quantity::new(2.0, Dimension::VOLUME))
            .unwrap_err();
        assert!(matches!(err, LedgerError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_repeated_scaling_overflow_is_an_error() {
        let mut a = ledger(Dimension::DIMENSIONLESS, &[(1, joules(2.0))]);
        let litres = Quantity::new(2.0, Dimension::VOLUME);
        for _ in 0..42 {
            a.scale(litres).unwrap();
        }
        let before = a.clone();
        assert!(matches!(
            a.scale(litres),
            Err(LedgerError::DimensionOverflow(_))
        ));
        assert_eq!(a, before);

        let mut b = ledger(Dimension::new(0, 0, 0, 0, i8::MAX), &[(1, joules(2.0))]);
        assert!(matches!(
            b.divide(Quantity::new(2.0, Dimension::CURRENCY)),
            Err(LedgerError::DimensionOverflow(_))
        ));
    }

    #[test]
    fn test_total_energy_ignores_other_dimensions() {
        let a = ledger(
            Dimension::DIMENSIONLESS,
            &[
                (1, joules(10.0)),
                (2, Quantity::new(7.0, Dimension::MASS)),
                (3, joules(2.5)),
                (4, Quantity::new(1.0, Dimension::VOLUME)),
            ],
        );
        assert_relative_eq!(a.total_energy().value, 12.5);
    }
}
