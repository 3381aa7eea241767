//! Core module - fundamental types and utilities

pub mod config;
pub mod dimension;
pub mod entity;
pub mod identity;
pub mod ids;

pub use config::{Config, ConfigError};
pub use dimension::{Dimension, DimensionError, DimensionOverflow, Quantity};
pub use entity::{Entity, Metadata};
pub use identity::{
    EntityKind, EntityRef, GroupId, Guid, IdParseError, MixId, ModeId, ParameterId, PathwayId,
    PollutantId, ProcessId, ResourceId, TechnologyId, VehicleId,
};
pub use ids::{IdGenerator, SequentialIds};
