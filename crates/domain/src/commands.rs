//! Creation commands for the two aggregates.

use common::{CageStatus, CageType, Diet, Species};

/// Command to build a new cage.
#[derive(Debug, Clone)]
pub struct NewCage {
    pub cage_type: CageType,

    /// Maximum occupants. Must be positive.
    pub capacity: u32,

    pub status: CageStatus,
}

impl NewCage {
    /// Creates a new NewCage command.
    pub fn new(cage_type: CageType, capacity: u32, status: CageStatus) -> Self {
        Self {
            cage_type,
            capacity,
            status,
        }
    }

    /// Creates a command for a powered cage.
    pub fn active(cage_type: CageType, capacity: u32) -> Self {
        Self::new(cage_type, capacity, CageStatus::Active)
    }
}

/// Command to register a new dinosaur.
#[derive(Debug, Clone)]
pub struct NewDinosaur {
    pub name: String,
    pub species: Species,

    /// Must agree with the species catalog.
    pub diet: Diet,
}

impl NewDinosaur {
    /// Creates a new NewDinosaur command.
    pub fn new(name: impl Into<String>, species: Species, diet: Diet) -> Self {
        Self {
            name: name.into(),
            species,
            diet,
        }
    }

    /// Creates a command whose diet is taken from the species catalog.
    pub fn of_species(name: impl Into<String>, species: Species) -> Self {
        Self::new(name, species, species.diet())
    }
}
