//! CLI command implementations

pub mod completions;
pub mod duplicate;
pub mod params;
pub mod usage;
pub mod where_used;
