use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    Cage, CageFilter, CageId, CageStatus, Dinosaur, DinosaurFilter, DinosaurId, OccupancyUpdate,
    Result, StoreError,
    store::{CageStore, DinosaurStore},
};

#[derive(Debug, Default)]
struct ParkState {
    cages: HashMap<CageId, Cage>,
    dinosaurs: HashMap<DinosaurId, Dinosaur>,
    fail_occupancy_writes: bool,
}

/// In-memory park store for tests and local runs.
///
/// Cages and dinosaurs sit behind a single lock, so an occupancy write
/// updates both or neither.
#[derive(Clone, Default)]
pub struct InMemoryParkStore {
    state: Arc<RwLock<ParkState>>,
}

impl InMemoryParkStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent occupancy write fail with
    /// [`StoreError::Unavailable`] until switched off again.
    pub async fn fail_occupancy_writes(&self, fail: bool) {
        self.state.write().await.fail_occupancy_writes = fail;
    }

    /// Returns the number of stored cages.
    pub async fn cage_count(&self) -> usize {
        self.state.read().await.cages.len()
    }

    /// Returns the number of stored dinosaurs.
    pub async fn dinosaur_count(&self) -> usize {
        self.state.read().await.dinosaurs.len()
    }
}

fn sorted_cages<'a>(cages: impl Iterator<Item = &'a Cage>) -> Vec<Cage> {
    let mut cages: Vec<Cage> = cages.cloned().collect();
    cages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    cages
}

fn sorted_dinosaurs<'a>(dinosaurs: impl Iterator<Item = &'a Dinosaur>) -> Vec<Dinosaur> {
    let mut dinosaurs: Vec<Dinosaur> = dinosaurs.cloned().collect();
    dinosaurs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    dinosaurs
}

#[async_trait]
impl CageStore for InMemoryParkStore {
    async fn create_cage(&self, cage: &Cage) -> Result<()> {
        let mut state = self.state.write().await;
        if state.cages.contains_key(&cage.id) {
            return Err(StoreError::cage_conflict(cage.id, "cage already exists"));
        }
        state.cages.insert(cage.id, cage.clone());
        Ok(())
    }

    async fn get_cage(&self, id: CageId) -> Result<Cage> {
        self.state
            .read()
            .await
            .cages
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::cage_not_found(id))
    }

    async fn list_cages(&self, filter: &CageFilter) -> Result<Vec<Cage>> {
        let state = self.state.read().await;
        Ok(sorted_cages(state.cages.values().filter(|cage| {
            filter.status.is_none_or(|status| cage.status == status)
        })))
    }

    async fn update_cage_status(
        &self,
        id: CageId,
        status: CageStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let cage = state
            .cages
            .get_mut(&id)
            .ok_or_else(|| StoreError::cage_not_found(id))?;

        if status.is_down() && !cage.is_empty() {
            return Err(StoreError::cage_conflict(
                id,
                format!("cannot power down with {} occupants", cage.current_capacity),
            ));
        }

        cage.status = status;
        cage.updated_at = at;
        Ok(())
    }

    async fn add_dinosaur(&self, update: &OccupancyUpdate) -> Result<()> {
        let mut state = self.state.write().await;
        let ParkState {
            cages,
            dinosaurs,
            fail_occupancy_writes,
        } = &mut *state;

        if *fail_occupancy_writes {
            return Err(StoreError::Unavailable(
                "occupancy writes are disabled".to_string(),
            ));
        }

        let cage = cages
            .get_mut(&update.cage_id)
            .ok_or_else(|| StoreError::cage_not_found(update.cage_id))?;
        let dinosaur = dinosaurs
            .get_mut(&update.dinosaur_id)
            .ok_or_else(|| StoreError::dinosaur_not_found(update.dinosaur_id))?;

        if cage.current_capacity != update.expected_occupancy {
            return Err(StoreError::cage_conflict(
                cage.id,
                format!(
                    "expected occupancy {}, found {}",
                    update.expected_occupancy, cage.current_capacity
                ),
            ));
        }
        if cage.status.is_down() {
            return Err(StoreError::cage_conflict(cage.id, "cage is powered down"));
        }
        if update.occupancy > cage.capacity {
            return Err(StoreError::InvalidData(format!(
                "occupancy {} exceeds capacity {} of cage {}",
                update.occupancy, cage.capacity, cage.id
            )));
        }
        if let Some(current) = dinosaur.cage_id {
            return Err(StoreError::dinosaur_conflict(
                dinosaur.id,
                format!("already lives in cage {current}"),
            ));
        }

        cage.current_capacity = update.occupancy;
        cage.updated_at = update.updated_at;
        dinosaur.cage_id = Some(cage.id);
        dinosaur.updated_at = update.updated_at;
        Ok(())
    }

    async fn remove_dinosaur(&self, update: &OccupancyUpdate) -> Result<()> {
        let mut state = self.state.write().await;
        let ParkState {
            cages,
            dinosaurs,
            fail_occupancy_writes,
        } = &mut *state;

        if *fail_occupancy_writes {
            return Err(StoreError::Unavailable(
                "occupancy writes are disabled".to_string(),
            ));
        }

        let cage = cages
            .get_mut(&update.cage_id)
            .ok_or_else(|| StoreError::cage_not_found(update.cage_id))?;
        let dinosaur = dinosaurs
            .get_mut(&update.dinosaur_id)
            .ok_or_else(|| StoreError::dinosaur_not_found(update.dinosaur_id))?;

        if cage.current_capacity != update.expected_occupancy {
            return Err(StoreError::cage_conflict(
                cage.id,
                format!(
                    "expected occupancy {}, found {}",
                    update.expected_occupancy, cage.current_capacity
                ),
            ));
        }
        if !dinosaur.is_in(cage.id) {
            return Err(StoreError::dinosaur_conflict(
                dinosaur.id,
                format!("does not live in cage {}", cage.id),
            ));
        }

        cage.current_capacity = update.occupancy;
        cage.updated_at = update.updated_at;
        dinosaur.cage_id = None;
        dinosaur.updated_at = update.updated_at;
        Ok(())
    }
}

#[async_trait]
impl DinosaurStore for InMemoryParkStore {
    async fn create_dinosaur(&self, dinosaur: &Dinosaur) -> Result<()> {
        let mut state = self.state.write().await;
        if state.dinosaurs.contains_key(&dinosaur.id) {
            return Err(StoreError::dinosaur_conflict(
                dinosaur.id,
                "dinosaur already exists",
            ));
        }
        state.dinosaurs.insert(dinosaur.id, dinosaur.clone());
        Ok(())
    }

    async fn get_dinosaur(&self, id: DinosaurId) -> Result<Dinosaur> {
        self.state
            .read()
            .await
            .dinosaurs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::dinosaur_not_found(id))
    }

    async fn list_dinosaurs(&self) -> Result<Vec<Dinosaur>> {
        let state = self.state.read().await;
        Ok(sorted_dinosaurs(state.dinosaurs.values()))
    }

    async fn list_dinosaurs_by_cage(
        &self,
        cage_id: CageId,
        filter: &DinosaurFilter,
    ) -> Result<Vec<Dinosaur>> {
        let state = self.state.read().await;
        Ok(sorted_dinosaurs(state.dinosaurs.values().filter(|dino| {
            dino.is_in(cage_id) && filter.species.is_none_or(|species| dino.species == species)
        })))
    }

    async fn update_dinosaur_name(
        &self,
        id: DinosaurId,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let dinosaur = state
            .dinosaurs
            .get_mut(&id)
            .ok_or_else(|| StoreError::dinosaur_not_found(id))?;
        dinosaur.name = name.to_string();
        dinosaur.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CageType, Diet, Species};

    async fn store_with_cage(capacity: u32) -> (InMemoryParkStore, Cage) {
        let store = InMemoryParkStore::new();
        let cage = Cage::new(CageType::Carnivore, capacity, CageStatus::Active);
        store.create_cage(&cage).await.unwrap();
        (store, cage)
    }

    async fn add_rex(store: &InMemoryParkStore) -> Dinosaur {
        let rex = Dinosaur::new("Rex", Species::Tyrannosaurus, Diet::Carnivore);
        store.create_dinosaur(&rex).await.unwrap();
        rex
    }

    #[tokio::test]
    async fn get_missing_records_is_not_found() {
        let store = InMemoryParkStore::new();
        assert!(store.get_cage(CageId::new()).await.unwrap_err().is_not_found());
        assert!(
            store
                .get_dinosaur(DinosaurId::new())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;

        assert_eq!(store.get_cage(cage.id).await.unwrap(), cage);
        assert_eq!(store.get_dinosaur(rex.id).await.unwrap(), rex);
        assert_eq!(store.cage_count().await, 1);
        assert_eq!(store.dinosaur_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let (store, cage) = store_with_cage(2).await;
        let result = store.create_cage(&cage).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn list_cages_filters_by_status() {
        let store = InMemoryParkStore::new();
        let active = Cage::new(CageType::Herbivore, 1, CageStatus::Active);
        let down = Cage::new(CageType::Herbivore, 1, CageStatus::Down);
        store.create_cage(&active).await.unwrap();
        store.create_cage(&down).await.unwrap();

        let all = store.list_cages(&CageFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_down = store
            .list_cages(&CageFilter::with_status(CageStatus::Down))
            .await
            .unwrap();
        assert_eq!(only_down, vec![down]);
    }

    #[tokio::test]
    async fn add_dinosaur_updates_both_records() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        let at = Utc::now();

        store
            .add_dinosaur(&OccupancyUpdate::admit(&cage, rex.id, at))
            .await
            .unwrap();

        let cage = store.get_cage(cage.id).await.unwrap();
        let rex = store.get_dinosaur(rex.id).await.unwrap();
        assert_eq!(cage.current_capacity, 1);
        assert_eq!(cage.updated_at, at);
        assert!(rex.is_in(cage.id));
        assert_eq!(rex.updated_at, at);

        let occupants = store
            .list_dinosaurs_by_cage(cage.id, &DinosaurFilter::new())
            .await
            .unwrap();
        assert_eq!(occupants, vec![rex]);
    }

    #[tokio::test]
    async fn stale_occupancy_writes_nothing() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        let mut stale = OccupancyUpdate::admit(&cage, rex.id, Utc::now());
        stale.expected_occupancy = 1;
        stale.occupancy = 2;

        let result = store.add_dinosaur(&stale).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { entity: "cage", .. })
        ));
        assert_eq!(store.get_cage(cage.id).await.unwrap(), cage);
        assert_eq!(store.get_dinosaur(rex.id).await.unwrap(), rex);
    }

    #[tokio::test]
    async fn add_missing_dinosaur_leaves_cage_untouched() {
        let (store, cage) = store_with_cage(2).await;
        let result = store
            .add_dinosaur(&OccupancyUpdate::admit(&cage, DinosaurId::new(), Utc::now()))
            .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.get_cage(cage.id).await.unwrap(), cage);
    }

    #[tokio::test]
    async fn remove_requires_the_link() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        store
            .add_dinosaur(&OccupancyUpdate::admit(&cage, rex.id, Utc::now()))
            .await
            .unwrap();
        let stranger = add_rex(&store).await;
        let cage = store.get_cage(cage.id).await.unwrap();

        let result = store
            .remove_dinosaur(&OccupancyUpdate::release(&cage, stranger.id, Utc::now()))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict {
                entity: "dinosaur",
                ..
            })
        ));

        store
            .remove_dinosaur(&OccupancyUpdate::release(&cage, rex.id, Utc::now()))
            .await
            .unwrap();
        assert!(store.get_cage(cage.id).await.unwrap().is_empty());
        assert_eq!(store.get_dinosaur(rex.id).await.unwrap().cage_id, None);
    }

    #[tokio::test]
    async fn failing_writes_are_all_or_nothing() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        store.fail_occupancy_writes(true).await;

        let result = store
            .add_dinosaur(&OccupancyUpdate::admit(&cage, rex.id, Utc::now()))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.get_cage(cage.id).await.unwrap(), cage);
        assert_eq!(store.get_dinosaur(rex.id).await.unwrap(), rex);
    }

    #[tokio::test]
    async fn add_into_powered_down_cage_is_a_conflict() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        store
            .update_cage_status(cage.id, CageStatus::Down, Utc::now())
            .await
            .unwrap();
        let down = store.get_cage(cage.id).await.unwrap();

        let result = store
            .add_dinosaur(&OccupancyUpdate::admit(&down, rex.id, Utc::now()))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { entity: "cage", .. })
        ));
        assert_eq!(store.get_cage(cage.id).await.unwrap(), down);
        assert_eq!(store.get_dinosaur(rex.id).await.unwrap(), rex);
    }

    #[tokio::test]
    async fn power_down_refused_while_occupied() {
        let (store, cage) = store_with_cage(2).await;
        let rex = add_rex(&store).await;
        store
            .add_dinosaur(&OccupancyUpdate::admit(&cage, rex.id, Utc::now()))
            .await
            .unwrap();

        let result = store
            .update_cage_status(cage.id, CageStatus::Down, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(
            store.get_cage(cage.id).await.unwrap().status,
            CageStatus::Active
        );
    }

    #[tokio::test]
    async fn list_by_cage_filters_species() {
        let store = InMemoryParkStore::new();
        let cage = Cage::new(CageType::Herbivore, 3, CageStatus::Active);
        store.create_cage(&cage).await.unwrap();

        for species in [Species::Triceratops, Species::Stegosaurus] {
            let dino = Dinosaur::new("Herb", species, Diet::Herbivore);
            store.create_dinosaur(&dino).await.unwrap();
            let current = store.get_cage(cage.id).await.unwrap();
            store
                .add_dinosaur(&OccupancyUpdate::admit(&current, dino.id, Utc::now()))
                .await
                .unwrap();
        }

        let trikes = store
            .list_dinosaurs_by_cage(cage.id, &DinosaurFilter::with_species(Species::Triceratops))
            .await
            .unwrap();
        assert_eq!(trikes.len(), 1);
        assert_eq!(trikes[0].species, Species::Triceratops);
    }

    #[tokio::test]
    async fn update_name_refreshes_timestamp() {
        let store = InMemoryParkStore::new();
        let rex = add_rex(&store).await;
        let at = Utc::now();
        store.update_dinosaur_name(rex.id, "Rexy", at).await.unwrap();

        let renamed = store.get_dinosaur(rex.id).await.unwrap();
        assert_eq!(renamed.name, "Rexy");
        assert_eq!(renamed.updated_at, at);
    }
}
