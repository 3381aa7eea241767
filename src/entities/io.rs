//! Inputs, outputs and the id references they carry

use serde::{Deserialize, Serialize};

use crate::core::identity::{Guid, MixId, ParameterId, PathwayId, ResourceId, TechnologyId};

/// Where an input's upstream burden comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// Extracted from the ground, no upstream
    Well,
    /// Produced by the previous process of the same pathway
    Previous,
    /// Produced by a pathway; `output` selects a pathway output, main output if absent
    Pathway {
        pathway: PathwayId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Guid>,
    },
    /// Produced by a mix
    Mix { mix: MixId },
}

impl Default for Source {
    fn default() -> Self {
        Source::Well
    }
}

impl Source {
    pub fn pathway(&self) -> Option<(PathwayId, Option<Guid>)> {
        match self {
            Source::Pathway { pathway, output } => Some((*pathway, *output)),
            _ => None,
        }
    }

    pub fn mix(&self) -> Option<MixId> {
        match self {
            Source::Mix { mix } => Some(*mix),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Well => write!(f, "well"),
            Source::Previous => write!(f, "previous"),
            Source::Pathway { pathway, .. } => write!(f, "pathway {}", pathway),
            Source::Mix { mix } => write!(f, "mix {}", mix),
        }
    }
}

/// Share of an input burned in a given technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyShare {
    pub technology: TechnologyId,
    pub share: ParameterId,
}

/// A resource consumed by a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Identifier usable as an edge endpoint
    #[serde(default)]
    pub id: Guid,

    pub resource: ResourceId,

    #[serde(default)]
    pub source: Source,

    /// Amount consumed per unit of main output
    pub amount: ParameterId,

    /// Combustion technologies the input is burned in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<TechnologyShare>,

    /// Fraction of the combustion emissions released in urban areas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urban_share: Option<ParameterId>,
}

impl Input {
    pub fn new(resource: ResourceId, source: Source, amount: ParameterId) -> Self {
        Self {
            id: Guid::new(),
            resource,
            source,
            amount,
            technologies: Vec::new(),
            urban_share: None,
        }
    }

    pub fn uses_technology(&self, technology: TechnologyId) -> bool {
        self.technologies.iter().any(|t| t.technology == technology)
    }
}

/// A resource produced by a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Identifier usable as an edge endpoint
    #[serde(default)]
    pub id: Guid,

    pub resource: ResourceId,

    /// Amount produced, if not the functional unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<ParameterId>,
}

impl Output {
    pub fn new(resource: ResourceId) -> Self {
        Self {
            id: Guid::new(),
            resource,
            amount: None,
        }
    }
}
