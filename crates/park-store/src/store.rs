use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Cage, CageFilter, CageId, CageStatus, Dinosaur, DinosaurFilter, DinosaurId, OccupancyUpdate,
    Result,
};

/// Persistence for cages.
///
/// All implementations must be thread-safe (Send + Sync). Lookups of a
/// missing cage fail with [`StoreError::NotFound`](crate::StoreError::NotFound).
#[async_trait]
pub trait CageStore: Send + Sync {
    /// Inserts a new cage.
    async fn create_cage(&self, cage: &Cage) -> Result<()>;

    /// Fetches a cage by id.
    async fn get_cage(&self, id: CageId) -> Result<Cage>;

    /// Lists cages matching the filter, oldest first.
    async fn list_cages(&self, filter: &CageFilter) -> Result<Vec<Cage>>;

    /// Sets the status of a cage.
    ///
    /// Switching to DOWN is refused with a concurrency conflict if the cage
    /// is occupied at the time of the write.
    async fn update_cage_status(
        &self,
        id: CageId,
        status: CageStatus,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Stores the new occupancy and links the dinosaur to the cage.
    ///
    /// Both writes are applied atomically - either both succeed or neither
    /// does. Fails with a concurrency conflict, writing nothing, when the
    /// stored occupancy differs from `update.expected_occupancy` or the
    /// dinosaur already lives in a cage.
    async fn add_dinosaur(&self, update: &OccupancyUpdate) -> Result<()>;

    /// Stores the new occupancy and unlinks the dinosaur from the cage.
    ///
    /// Atomic like [`CageStore::add_dinosaur`]. Fails with a concurrency
    /// conflict when the dinosaur is not linked to this cage.
    async fn remove_dinosaur(&self, update: &OccupancyUpdate) -> Result<()>;
}

/// Persistence for dinosaurs.
#[async_trait]
pub trait DinosaurStore: Send + Sync {
    /// Inserts a new dinosaur.
    async fn create_dinosaur(&self, dinosaur: &Dinosaur) -> Result<()>;

    /// Fetches a dinosaur by id.
    async fn get_dinosaur(&self, id: DinosaurId) -> Result<Dinosaur>;

    /// Lists every dinosaur, oldest first.
    async fn list_dinosaurs(&self) -> Result<Vec<Dinosaur>>;

    /// Lists the dinosaurs living in a cage, oldest first.
    async fn list_dinosaurs_by_cage(
        &self,
        cage_id: CageId,
        filter: &DinosaurFilter,
    ) -> Result<Vec<Dinosaur>>;

    /// Renames a dinosaur.
    async fn update_dinosaur_name(
        &self,
        id: DinosaurId,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

/// A store that persists both aggregates.
pub trait ParkStore: CageStore + DinosaurStore + Clone + 'static {}

impl<T: CageStore + DinosaurStore + Clone + 'static> ParkStore for T {}
