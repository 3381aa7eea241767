//! Parameter discovery and cross-entity dependency resolution

pub mod dependents;
pub mod formula;
pub mod params;
pub mod usage;
pub mod visit;

pub use dependents::{
    Dependent, Dependents, DependencyResolver, Relation, ResolveOptions, ScanMode, ShareFilter,
};
pub use params::ParameterReferenceIndex;
pub use usage::UsageReport;
pub use visit::{HasParameters, ParameterVisitor, RemapParameters};
