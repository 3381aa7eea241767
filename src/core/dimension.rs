//! Dimension tags and dimensioned scalars
//!
//! A [`Dimension`] is an exponent vector over a small set of base
//! quantities. Multiplying two quantities adds their exponent vectors,
//! dividing subtracts them. No unit conversion happens here: every
//! [`Quantity`] magnitude is assumed to be in the canonical unit of its
//! dimension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul, Neg};
use thiserror::Error;

/// Base quantities a [`Dimension`] is expressed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseQuantity {
    Mass,
    Length,
    Time,
    Temperature,
    Currency,
}

impl BaseQuantity {
    /// Canonical unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BaseQuantity::Mass => "kg",
            BaseQuantity::Length => "m",
            BaseQuantity::Time => "s",
            BaseQuantity::Temperature => "K",
            BaseQuantity::Currency => "$",
        }
    }

    /// All base quantities in exponent-vector order
    pub fn all() -> &'static [BaseQuantity] {
        &[
            BaseQuantity::Mass,
            BaseQuantity::Length,
            BaseQuantity::Time,
            BaseQuantity::Temperature,
            BaseQuantity::Currency,
        ]
    }
}

/// A physical dimension as an exponent vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    #[serde(skip_serializing_if = "is_zero")]
    pub mass: i8,
    #[serde(skip_serializing_if = "is_zero")]
    pub length: i8,
    #[serde(skip_serializing_if = "is_zero")]
    pub time: i8,
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature: i8,
    #[serde(skip_serializing_if = "is_zero")]
    pub currency: i8,
}

fn is_zero(exp: &i8) -> bool {
    *exp == 0
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::new(0, 0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(1, 0, 0, 0, 0);
    pub const DISTANCE: Dimension = Dimension::new(0, 1, 0, 0, 0);
    pub const AREA: Dimension = Dimension::new(0, 2, 0, 0, 0);
    pub const VOLUME: Dimension = Dimension::new(0, 3, 0, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0, 0);
    pub const ENERGY: Dimension = Dimension::new(1, 2, -2, 0, 0);
    pub const POWER: Dimension = Dimension::new(1, 2, -3, 0, 0);
    pub const CURRENCY: Dimension = Dimension::new(0, 0, 0, 0, 1);

    /// Build a dimension from its exponents (mass, length, time, temperature, currency)
    pub const fn new(mass: i8, length: i8, time: i8, temperature: i8, currency: i8) -> Self {
        Self {
            mass,
            length,
            time,
            temperature,
            currency,
        }
    }

    fn exponents(&self) -> [i8; 5] {
        [
            self.mass,
            self.length,
            self.time,
            self.temperature,
            self.currency,
        ]
    }

    fn from_exponents(e: [i8; 5]) -> Self {
        Self::new(e[0], e[1], e[2], e[3], e[4])
    }

    /// Sum of exponent vectors (dimension of a product)
    ///
    /// Exponents saturate at the `i8` range; use [`Dimension::checked_plus`]
    /// where the operands come from data.
    pub fn plus(self, other: Dimension) -> Dimension {
        let (a, b) = (self.exponents(), other.exponents());
        Self::from_exponents(std::array::from_fn(|i| a[i].saturating_add(b[i])))
    }

    /// Difference of exponent vectors (dimension of a quotient), saturating
    pub fn minus(self, other: Dimension) -> Dimension {
        let (a, b) = (self.exponents(), other.exponents());
        Self::from_exponents(std::array::from_fn(|i| a[i].saturating_sub(b[i])))
    }

    /// Sum of exponent vectors, failing when an exponent leaves the `i8` range
    pub fn checked_plus(self, other: Dimension) -> Result<Dimension, DimensionOverflow> {
        self.checked_with(other, i8::checked_add)
    }

    /// Difference of exponent vectors, failing when an exponent leaves the `i8` range
    pub fn checked_minus(self, other: Dimension) -> Result<Dimension, DimensionOverflow> {
        self.checked_with(other, i8::checked_sub)
    }

    fn checked_with(
        self,
        other: Dimension,
        op: fn(i8, i8) -> Option<i8>,
    ) -> Result<Dimension, DimensionOverflow> {
        let (a, b) = (self.exponents(), other.exponents());
        let mut out = [0i8; 5];
        for (slot, (x, y)) in out.iter_mut().zip(a.into_iter().zip(b)) {
            *slot = op(x, y).ok_or(DimensionOverflow {
                left: self,
                right: other,
            })?;
        }
        Ok(Self::from_exponents(out))
    }

    /// Negated exponent vector
    pub fn reciprocal(self) -> Dimension {
        Self::from_exponents(self.exponents().map(i8::saturating_neg))
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Dimension::DIMENSIONLESS
    }

    /// Canonical display quantity for this dimension, if it has a common name
    pub fn quantity_name(&self) -> Option<&'static str> {
        let name = match *self {
            Dimension::DIMENSIONLESS => "dimensionless",
            Dimension::MASS => "mass",
            Dimension::DISTANCE => "distance",
            Dimension::AREA => "area",
            Dimension::VOLUME => "volume",
            Dimension::TIME => "time",
            Dimension::ENERGY => "energy",
            Dimension::POWER => "power",
            Dimension::CURRENCY => "currency",
            d if d == Dimension::ENERGY.minus(Dimension::MASS) => "heating value (mass)",
            d if d == Dimension::ENERGY.minus(Dimension::VOLUME) => "heating value (volume)",
            d if d == Dimension::MASS.minus(Dimension::VOLUME) => "density",
            d if d == Dimension::MASS.minus(Dimension::ENERGY) => "emission factor",
            d if d == Dimension::ENERGY.minus(Dimension::DISTANCE) => "energy intensity",
            d if d == Dimension::MASS.plus(Dimension::DISTANCE) => "transport work",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<(&BaseQuantity, i8)> =
            BaseQuantity::all().iter().zip(self.exponents()).collect();

        let mut written = false;
        for (base, exp) in pairs.iter().filter(|(_, e)| *e > 0) {
            if written {
                write!(f, "*")?;
            }
            write!(f, "{}", base.symbol())?;
            if *exp > 1 {
                write!(f, "^{}", exp)?;
            }
            written = true;
        }

        for (base, exp) in pairs.iter().filter(|(_, e)| *e < 0) {
            if !written {
                write!(f, "1")?;
                written = true;
            }
            write!(f, "/{}", base.symbol())?;
            if *exp < -1 {
                write!(f, "^{}", -exp)?;
            }
        }

        if !written {
            write!(f, "dmnl")?;
        }
        Ok(())
    }
}

/// Two quantities that cannot be added or compared
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("dimension mismatch: {left} vs {right}")]
pub struct DimensionError {
    pub left: Dimension,
    pub right: Dimension,
}

/// Dimension arithmetic whose exponents fall outside the representable range
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("dimension exponent out of range combining {left} with {right}")]
pub struct DimensionOverflow {
    pub left: Dimension,
    pub right: Dimension,
}

/// A magnitude tagged with a dimension
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Dimension::is_dimensionless")]
    pub dim: Dimension,
}

impl Quantity {
    pub fn new(value: f64, dim: Dimension) -> Self {
        Self { value, dim }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Dimension::DIMENSIONLESS)
    }

    pub fn zero(dim: Dimension) -> Self {
        Self::new(0.0, dim)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Add two quantities of the same dimension
    pub fn checked_add(self, rhs: Quantity) -> Result<Quantity, DimensionError> {
        if self.dim != rhs.dim {
            return Err(DimensionError {
                left: self.dim,
                right: rhs.dim,
            });
        }
        Ok(Quantity::new(self.value + rhs.value, self.dim))
    }

    pub fn checked_sub(self, rhs: Quantity) -> Result<Quantity, DimensionError> {
        self.checked_add(-rhs)
    }

    /// Compare magnitudes within a relative tolerance, requiring equal dimensions
    pub fn approx_eq(&self, other: &Quantity, epsilon: f64) -> bool {
        if self.dim != other.dim {
            return false;
        }
        let scale = self.value.abs().max(other.value.abs()).max(1.0);
        (self.value - other.value).abs() <= epsilon * scale
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.dim)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.value * rhs.value, self.dim.plus(rhs.dim))
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.value / rhs.value, self.dim.minus(rhs.dim))
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.value * rhs, self.dim)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if self.dim != other.dim {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim.is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.dim)
        }
    }
}
