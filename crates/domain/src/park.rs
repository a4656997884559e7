use park_store::ParkStore;

use crate::cage::CageService;
use crate::dinosaur::DinosaurService;
use crate::occupancy::{CageLocks, OccupancyEngine};

/// The three services over one store, sharing one lock registry.
pub struct Park<S: ParkStore> {
    pub cages: CageService<S>,
    pub dinosaurs: DinosaurService<S>,
    pub occupancy: OccupancyEngine<S>,
}

impl<S: ParkStore> Park<S> {
    pub fn new(store: S) -> Self {
        let locks = CageLocks::new();
        Self {
            cages: CageService::with_locks(store.clone(), locks.clone()),
            dinosaurs: DinosaurService::new(store.clone()),
            occupancy: OccupancyEngine::with_locks(store, locks),
        }
    }
}
