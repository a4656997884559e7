//! Fixed vocabularies for cages and dinosaurs.
//!
//! Every type here parses case-insensitively and renders in its canonical
//! spelling: upper case for cage types, statuses and diets, title case for
//! species.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value that is not part of one of the catalog vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("invalid cage type: {0:?}")]
    UnknownCageType(String),

    #[error("invalid cage status: {0:?}")]
    UnknownCageStatus(String),

    #[error("invalid diet: {0:?}")]
    UnknownDiet(String),

    #[error("invalid species: {0:?}")]
    UnknownSpecies(String),
}

/// What a dinosaur eats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Diet {
    Carnivore,
    Herbivore,
}

impl Diet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Carnivore => "CARNIVORE",
            Diet::Herbivore => "HERBIVORE",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diet {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARNIVORE" => Ok(Diet::Carnivore),
            "HERBIVORE" => Ok(Diet::Herbivore),
            _ => Err(CatalogError::UnknownDiet(s.to_string())),
        }
    }
}

/// The kind of dinosaur a cage is built to hold.
///
/// Shares its vocabulary with [`Diet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CageType {
    Herbivore,
    Carnivore,
}

impl CageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CageType::Herbivore => "HERBIVORE",
            CageType::Carnivore => "CARNIVORE",
        }
    }

    /// Returns the diet this cage type houses.
    pub fn diet(&self) -> Diet {
        match self {
            CageType::Herbivore => Diet::Herbivore,
            CageType::Carnivore => Diet::Carnivore,
        }
    }

    /// Returns true if a dinosaur with the given diet may live in this cage.
    pub fn accepts(&self, diet: Diet) -> bool {
        self.diet() == diet
    }
}

impl fmt::Display for CageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CageType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HERBIVORE" => Ok(CageType::Herbivore),
            "CARNIVORE" => Ok(CageType::Carnivore),
            _ => Err(CatalogError::UnknownCageType(s.to_string())),
        }
    }
}

/// Power state of a cage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CageStatus {
    #[default]
    Active,
    Down,
}

impl CageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CageStatus::Active => "ACTIVE",
            CageStatus::Down => "DOWN",
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, CageStatus::Down)
    }
}

impl fmt::Display for CageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CageStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(CageStatus::Active),
            "DOWN" => Ok(CageStatus::Down),
            _ => Err(CatalogError::UnknownCageStatus(s.to_string())),
        }
    }
}

/// Species known to the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Tyrannosaurus,
    Velociraptor,
    Spinosaurus,
    Megalosaurus,
    Brachiosaurus,
    Stegosaurus,
    Ankylosaurus,
    Triceratops,
}

impl Species {
    /// The full species table with each species' diet.
    pub const ALL: [(Species, Diet); 8] = [
        (Species::Tyrannosaurus, Diet::Carnivore),
        (Species::Velociraptor, Diet::Carnivore),
        (Species::Spinosaurus, Diet::Carnivore),
        (Species::Megalosaurus, Diet::Carnivore),
        (Species::Brachiosaurus, Diet::Herbivore),
        (Species::Stegosaurus, Diet::Herbivore),
        (Species::Ankylosaurus, Diet::Herbivore),
        (Species::Triceratops, Diet::Herbivore),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Tyrannosaurus => "Tyrannosaurus",
            Species::Velociraptor => "Velociraptor",
            Species::Spinosaurus => "Spinosaurus",
            Species::Megalosaurus => "Megalosaurus",
            Species::Brachiosaurus => "Brachiosaurus",
            Species::Stegosaurus => "Stegosaurus",
            Species::Ankylosaurus => "Ankylosaurus",
            Species::Triceratops => "Triceratops",
        }
    }

    pub fn diet(&self) -> Diet {
        match self {
            Species::Tyrannosaurus
            | Species::Velociraptor
            | Species::Spinosaurus
            | Species::Megalosaurus => Diet::Carnivore,
            Species::Brachiosaurus
            | Species::Stegosaurus
            | Species::Ankylosaurus
            | Species::Triceratops => Diet::Herbivore,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Species::ALL
            .iter()
            .map(|(species, _)| *species)
            .find(|species| species.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::UnknownSpecies(s.to_string()))
    }
}

/// Looks up the diet of a species by name.
pub fn species_diet(name: &str) -> Result<Diet, CatalogError> {
    name.parse::<Species>().map(|species| species.diet())
}
