//! LCAG: lifecycle emissions graph core
//!
//! Dimension-checked emission and resource ledgers, and dependency queries
//! over a graph of pathways, processes, mixes, resources, technologies,
//! transportation modes and vehicles.

pub mod cli;
pub mod core;
pub mod duplicate;
pub mod entities;
pub mod graph;
pub mod ledger;
pub mod resolver;
pub mod yaml;
