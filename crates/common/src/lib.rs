//! Shared identifiers and vocabulary types used across the workspace.

pub mod catalog;
pub mod types;

pub use catalog::{CageStatus, CageType, CatalogError, Diet, Species, species_diet};
pub use types::{CageId, DinosaurId};
