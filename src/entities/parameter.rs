//! Parameter - a user-overridable numeric cell, optionally formula-driven

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::dimension::Quantity;
use crate::core::identity::ParameterId;

/// Calendar year used to key time series values
pub type Year = i32;

/// Resolved value of a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A single value valid for every year
    Scalar(Quantity),
    /// Values keyed by year
    Series(BTreeMap<Year, Quantity>),
}

impl Default for ParameterValue {
    fn default() -> Self {
        ParameterValue::Scalar(Quantity::default())
    }
}

impl ParameterValue {
    /// Value in effect for a year: the closest earlier entry, or the first one
    pub fn at(&self, year: Year) -> Option<Quantity> {
        match self {
            ParameterValue::Scalar(q) => Some(*q),
            ParameterValue::Series(series) => series
                .range(..=year)
                .next_back()
                .or_else(|| series.iter().next())
                .map(|(_, q)| *q),
        }
    }

    /// True when every point of the value is zero
    pub fn is_zero_everywhere(&self) -> bool {
        match self {
            ParameterValue::Scalar(q) => q.is_zero(),
            ParameterValue::Series(series) => series.values().all(Quantity::is_zero),
        }
    }
}

/// A parameter of the global parameter table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Unique key
    pub id: ParameterId,

    /// Human readable name, usable in formulas as `[name]`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Current value
    #[serde(default)]
    pub value: ParameterValue,

    /// Formula referencing other parameters as `[id]` or `[name]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Parameter {
    pub fn new(id: impl Into<String>, value: Quantity) -> Self {
        Self {
            id: ParameterId::new(id),
            name: String::new(),
            value: ParameterValue::Scalar(value),
            formula: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn has_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| !f.trim().is_empty())
    }

    /// Bracketed tokens other formulas use to refer to this parameter
    pub fn reference_tokens(&self) -> Vec<String> {
        let mut tokens = vec![format!("[{}]", self.id)];
        if !self.name.is_empty() {
            tokens.push(format!("[{}]", self.name));
        }
        tokens
    }

    /// Whether this parameter's formula mentions `other` by bracketed id or name
    pub fn references(&self, other: &Parameter) -> bool {
        match self.formula.as_deref() {
            Some(formula) => other
                .reference_tokens()
                .iter()
                .any(|token| formula.contains(token.as_str())),
            None => false,
        }
    }
}
