use common::{CageStatus, Species};

/// Filter for listing cages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CageFilter {
    /// Only cages in this status.
    pub status: Option<CageStatus>,
}

impl CageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: CageStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}

/// Filter for listing the dinosaurs in a cage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DinosaurFilter {
    /// Only dinosaurs of this species.
    pub species: Option<Species>,
}

impl DinosaurFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(species: Species) -> Self {
        Self {
            species: Some(species),
        }
    }
}
