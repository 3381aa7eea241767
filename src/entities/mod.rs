//! Entity type definitions
//!
//! The graph holds the following kinds, each keyed by an integer id unique
//! within its own collection:
//!
//! **Production:**
//! - [`Pathway`] - Process network producing a resource, with internal vertices and edges
//! - [`Process`] - Stationary or transportation process with inputs and outputs
//! - [`Mix`] - Weighted blend of pathways and other mixes
//! - [`Resource`] - Fuel, feedstock or material
//!
//! **Transportation:**
//! - [`Technology`] - Combustion technology with emission factors
//! - [`Mode`] - Transportation mode with fuel shares
//! - [`Vehicle`] - Fuel and material consumer
//!
//! Numeric values live in the flat [`Parameter`] table and are referenced by
//! [`crate::core::identity::ParameterId`].

pub mod io;
pub mod mix;
pub mod mode;
pub mod parameter;
pub mod pathway;
pub mod process;
pub mod resource;
pub mod technology;
pub mod vehicle;

pub use io::{Input, Output, Source, TechnologyShare};
pub use mix::{FeedSource, Mix, MixFeed};
pub use mode::{EnergySource, FuelShare, Mode, ModeKind};
pub use parameter::{Parameter, ParameterValue, Year};
pub use pathway::{Edge, EdgeInsert, Endpoint, Pathway, PathwayError, PathwayOutput, Vertex, VertexModel};
pub use process::{CoProduct, InputGroup, Process, ProcessKind, Sequestration, TransportStep, Treatment};
pub use resource::{Resource, ResourceState};
pub use technology::{EmissionFactor, Technology};
pub use vehicle::{Vehicle, VehicleFuel, VehicleMaterial};
