//! Dimensioned accumulation of resource use and emissions

pub mod bundle;
pub mod combined;
pub mod quantity;
pub mod species;

pub use bundle::ResultBundle;
pub use combined::CombinedFlow;
pub use quantity::{LedgerError, QuantityLedger, SpeciesKey};
pub use species::{EmissionLedger, GroupLedger, Pollutant, ResourceLedger, SpeciesGroup, SpeciesTable};
