//! Domain layer for the containment facility.
//!
//! This crate provides:
//! - The cage and dinosaur services
//! - The occupancy engine that moves dinosaurs between cages
//! - The facility rules as pure functions over stored snapshots

pub mod cage;
pub mod commands;
pub mod dinosaur;
pub mod error;
pub mod occupancy;
mod park;

pub use cage::CageService;
pub use commands::{NewCage, NewDinosaur};
pub use dinosaur::DinosaurService;
pub use error::{DomainError, RuleViolation};
pub use occupancy::{CageLocks, OccupancyEngine};
pub use park::Park;
