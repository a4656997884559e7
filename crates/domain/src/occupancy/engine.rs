use chrono::Utc;
use common::{CageId, DinosaurId};
use park_store::{Cage, CageStore, Dinosaur, DinosaurFilter, DinosaurStore, OccupancyUpdate};

use crate::cage::rules;
use crate::error::{DomainError, RuleViolation, StoreContext};

use super::CageLocks;

/// Places dinosaurs into cages and takes them out again.
///
/// Every operation holds the cage's lock from the first read to the final
/// write, and the write itself is a single atomic store call guarded by the
/// occupancy count observed under the lock.
pub struct OccupancyEngine<S> {
    store: S,
    locks: CageLocks,
}

impl<S: CageStore + DinosaurStore> OccupancyEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_locks(store, CageLocks::new())
    }

    pub fn with_locks(store: S, locks: CageLocks) -> Self {
        Self { store, locks }
    }

    pub fn locks(&self) -> &CageLocks {
        &self.locks
    }

    /// Moves an uncaged dinosaur into a cage and returns the updated cage.
    #[tracing::instrument(skip(self))]
    pub async fn add_dinosaur_to_cage(
        &self,
        cage_id: CageId,
        dinosaur_id: DinosaurId,
    ) -> Result<Cage, DomainError> {
        let _guard = self.locks.lock(cage_id).await;

        let mut cage = self.store.get_cage(cage_id).await.context("fetch cage")?;
        rules::check_cage_open(&cage).map_err(rejected)?;

        let dinosaur = self
            .store
            .get_dinosaur(dinosaur_id)
            .await
            .context("fetch dinosaur")?;
        rules::check_diet(&cage, &dinosaur).map_err(rejected)?;

        let occupants = if rules::requires_single_species(&cage) {
            self.store
                .list_dinosaurs_by_cage(cage_id, &DinosaurFilter::new())
                .await
                .context("list cage occupants")?
        } else {
            Vec::new()
        };
        rules::check_admission(&cage, &dinosaur, &occupants).map_err(rejected)?;

        let update = OccupancyUpdate::admit(&cage, dinosaur_id, Utc::now());
        self.store
            .add_dinosaur(&update)
            .await
            .context("add dinosaur to cage")?;

        metrics::counter!("occupancy_placements_total").increment(1);
        tracing::info!(
            cage_id = %cage_id,
            dinosaur_id = %dinosaur_id,
            occupancy = update.occupancy,
            capacity = cage.capacity,
            "Dinosaur placed"
        );

        cage.current_capacity = update.occupancy;
        cage.updated_at = update.updated_at;
        Ok(cage)
    }

    /// Takes a dinosaur out of the cage it lives in and returns the updated cage.
    #[tracing::instrument(skip(self))]
    pub async fn remove_dinosaur_from_cage(
        &self,
        cage_id: CageId,
        dinosaur_id: DinosaurId,
    ) -> Result<Cage, DomainError> {
        let _guard = self.locks.lock(cage_id).await;

        let mut cage = self.store.get_cage(cage_id).await.context("fetch cage")?;
        rules::check_cage_not_empty(&cage).map_err(rejected)?;

        let dinosaur = self
            .store
            .get_dinosaur(dinosaur_id)
            .await
            .context("fetch dinosaur")?;
        rules::check_removal(&cage, &dinosaur).map_err(rejected)?;

        let update = OccupancyUpdate::release(&cage, dinosaur_id, Utc::now());
        self.store
            .remove_dinosaur(&update)
            .await
            .context("remove dinosaur from cage")?;

        metrics::counter!("occupancy_removals_total").increment(1);
        tracing::info!(
            cage_id = %cage_id,
            dinosaur_id = %dinosaur_id,
            occupancy = update.occupancy,
            "Dinosaur removed"
        );

        cage.current_capacity = update.occupancy;
        cage.updated_at = update.updated_at;
        Ok(cage)
    }

    /// Reads a cage and its occupants under the cage lock, so the occupant
    /// list always matches `current_capacity`.
    #[tracing::instrument(skip(self))]
    pub async fn cage_with_occupants(
        &self,
        cage_id: CageId,
    ) -> Result<(Cage, Vec<Dinosaur>), DomainError> {
        let _guard = self.locks.lock(cage_id).await;

        let cage = self.store.get_cage(cage_id).await.context("fetch cage")?;
        let occupants = if cage.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_dinosaurs_by_cage(cage_id, &DinosaurFilter::new())
                .await
                .context("list cage occupants")?
        };
        Ok((cage, occupants))
    }
}

fn rejected(violation: RuleViolation) -> DomainError {
    metrics::counter!("occupancy_rejections_total", "reason" => violation.kind()).increment(1);
    tracing::debug!(reason = violation.kind(), "Occupancy change rejected");
    DomainError::Rule(violation)
}
