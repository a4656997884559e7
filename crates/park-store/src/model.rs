//! Persisted cage and dinosaur records.

use chrono::{DateTime, Utc};
use common::{CageId, CageStatus, CageType, Diet, DinosaurId, Species};
use serde::{Deserialize, Serialize};

/// An enclosure in the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cage {
    pub id: CageId,
    pub cage_type: CageType,
    /// Maximum number of occupants, fixed at creation.
    pub capacity: u32,
    /// Number of dinosaurs currently assigned to this cage.
    pub current_capacity: u32,
    pub status: CageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cage {
    /// Creates an empty cage with a fresh id, stamped with the current time.
    pub fn new(cage_type: CageType, capacity: u32, status: CageStatus) -> Self {
        let now = Utc::now();
        Self {
            id: CageId::new(),
            cage_type,
            capacity,
            current_capacity: 0,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_capacity == 0
    }

    pub fn is_full(&self) -> bool {
        self.current_capacity >= self.capacity
    }
}

/// A dinosaur housed by the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dinosaur {
    pub id: DinosaurId,
    /// The cage this dinosaur lives in, if any.
    pub cage_id: Option<CageId>,
    pub name: String,
    pub species: Species,
    pub diet: Diet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dinosaur {
    /// Creates an unassigned dinosaur with a fresh id.
    pub fn new(name: impl Into<String>, species: Species, diet: Diet) -> Self {
        let now = Utc::now();
        Self {
            id: DinosaurId::new(),
            cage_id: None,
            name: name.into(),
            species,
            diet,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_in(&self, cage_id: CageId) -> bool {
        self.cage_id == Some(cage_id)
    }
}

/// One occupancy change: the cage count update and the dinosaur link update
/// that must be applied together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyUpdate {
    pub cage_id: CageId,
    pub dinosaur_id: DinosaurId,
    /// The occupancy the caller read before deciding on this change.
    pub expected_occupancy: u32,
    /// The occupancy to store.
    pub occupancy: u32,
    pub updated_at: DateTime<Utc>,
}

impl OccupancyUpdate {
    /// Describes adding `dinosaur_id` to `cage`, one more occupant.
    pub fn admit(cage: &Cage, dinosaur_id: DinosaurId, at: DateTime<Utc>) -> Self {
        Self {
            cage_id: cage.id,
            dinosaur_id,
            expected_occupancy: cage.current_capacity,
            occupancy: cage.current_capacity + 1,
            updated_at: at,
        }
    }

    /// Describes removing `dinosaur_id` from `cage`, one fewer occupant.
    pub fn release(cage: &Cage, dinosaur_id: DinosaurId, at: DateTime<Utc>) -> Self {
        Self {
            cage_id: cage.id,
            dinosaur_id,
            expected_occupancy: cage.current_capacity,
            occupancy: cage.current_capacity.saturating_sub(1),
            updated_at: at,
        }
    }
}
