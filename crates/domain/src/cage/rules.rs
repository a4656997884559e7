//! Facility rules, evaluated against an observed snapshot.
//!
//! Each check returns the first rule it finds broken. The occupancy engine
//! runs them in a fixed order under the cage lock.

use common::{CageStatus, CageType};
use park_store::{Cage, Dinosaur};

use crate::error::RuleViolation;

/// Returns whether the cage is able to take one more occupant.
pub fn check_cage_open(cage: &Cage) -> Result<(), RuleViolation> {
    if cage.status.is_down() {
        return Err(RuleViolation::CagePoweredDown);
    }
    if cage.is_full() {
        return Err(RuleViolation::CageAtCapacity {
            capacity: cage.capacity,
        });
    }
    Ok(())
}

/// Returns whether the dinosaur's diet fits the cage type.
pub fn check_diet(cage: &Cage, dinosaur: &Dinosaur) -> Result<(), RuleViolation> {
    if cage.cage_type.accepts(dinosaur.diet) {
        Ok(())
    } else {
        Err(RuleViolation::TypeMismatch {
            cage_type: cage.cage_type,
            diet: dinosaur.diet,
        })
    }
}

/// Carnivore cages only ever hold one species. Herbivores mix freely.
pub fn requires_single_species(cage: &Cage) -> bool {
    cage.cage_type == CageType::Carnivore && !cage.is_empty()
}

/// Checks the dinosaur against the current occupants and its own placement.
///
/// `occupants` only needs to be populated when
/// [`requires_single_species`] holds for the cage.
pub fn check_admission(
    cage: &Cage,
    dinosaur: &Dinosaur,
    occupants: &[Dinosaur],
) -> Result<(), RuleViolation> {
    if requires_single_species(cage) {
        if let Some(resident) = occupants.iter().find(|o| o.species != dinosaur.species) {
            return Err(RuleViolation::SpeciesConflict {
                resident: resident.species,
                incoming: dinosaur.species,
            });
        }
    }
    if let Some(cage_id) = dinosaur.cage_id {
        return Err(RuleViolation::DinosaurAlreadyCaged { cage_id });
    }
    Ok(())
}

/// Checks that the dinosaur can be taken out of the cage.
///
/// The empty check comes first and does not need the dinosaur, so callers
/// may run [`check_cage_not_empty`] before fetching it.
pub fn check_removal(cage: &Cage, dinosaur: &Dinosaur) -> Result<(), RuleViolation> {
    check_cage_not_empty(cage)?;
    if !dinosaur.is_in(cage.id) {
        return Err(RuleViolation::DinosaurNotInCage { cage_id: cage.id });
    }
    Ok(())
}

pub fn check_cage_not_empty(cage: &Cage) -> Result<(), RuleViolation> {
    if cage.is_empty() {
        Err(RuleViolation::EmptyCageRemoval)
    } else {
        Ok(())
    }
}

/// Decides a status change.
///
/// Returns `Ok(false)` when the cage already has `status` and nothing needs
/// to be written.
pub fn check_status_change(cage: &Cage, status: CageStatus) -> Result<bool, RuleViolation> {
    if cage.status == status {
        return Ok(false);
    }
    if status.is_down() && !cage.is_empty() {
        return Err(RuleViolation::PowerDownWithOccupants {
            occupants: cage.current_capacity,
        });
    }
    Ok(true)
}
