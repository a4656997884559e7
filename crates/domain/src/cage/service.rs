//! Cage service providing creation, lookup and power control.

use chrono::Utc;
use common::{CageId, CageStatus};
use park_store::{Cage, CageFilter, CageStore};

use crate::commands::NewCage;
use crate::error::{DomainError, StoreContext};
use crate::occupancy::CageLocks;

use super::rules;

/// Service for managing cages.
///
/// Status changes share their lock registry with the
/// [`OccupancyEngine`](crate::OccupancyEngine), so a power-down never
/// interleaves with a placement into the same cage.
pub struct CageService<S: CageStore> {
    store: S,
    locks: CageLocks,
}

impl<S: CageStore> CageService<S> {
    /// Creates a cage service with its own lock registry.
    pub fn new(store: S) -> Self {
        Self::with_locks(store, CageLocks::new())
    }

    /// Creates a cage service that serializes on an existing registry.
    pub fn with_locks(store: S, locks: CageLocks) -> Self {
        Self { store, locks }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_cage(&self, cmd: NewCage) -> Result<Cage, DomainError> {
        if cmd.capacity == 0 {
            return Err(DomainError::invalid_input("capacity must be greater than zero"));
        }

        let cage = Cage::new(cmd.cage_type, cmd.capacity, cmd.status);
        self.store.create_cage(&cage).await.context("create cage")?;

        tracing::info!(cage_id = %cage.id, cage_type = %cage.cage_type, "Cage created");
        Ok(cage)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_cage(&self, id: CageId) -> Result<Cage, DomainError> {
        self.store.get_cage(id).await.context("fetch cage")
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_cages(&self, filter: CageFilter) -> Result<Vec<Cage>, DomainError> {
        self.store.list_cages(&filter).await.context("list cages")
    }

    /// Powers a cage up or down.
    ///
    /// Returns the cage unchanged when it already has `status`. An occupied
    /// cage cannot be powered down.
    #[tracing::instrument(skip(self))]
    pub async fn change_cage_status(
        &self,
        id: CageId,
        status: CageStatus,
    ) -> Result<Cage, DomainError> {
        let _guard = self.locks.lock(id).await;

        let mut cage = self.store.get_cage(id).await.context("fetch cage")?;
        if !rules::check_status_change(&cage, status)? {
            return Ok(cage);
        }

        let now = Utc::now();
        self.store
            .update_cage_status(id, status, now)
            .await
            .context("update cage status")?;

        metrics::counter!("cage_status_changes_total", "status" => status.as_str()).increment(1);
        tracing::info!(cage_id = %id, from = %cage.status, to = %status, "Cage status changed");

        cage.status = status;
        cage.updated_at = now;
        Ok(cage)
    }
}
