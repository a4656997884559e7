use chrono::Utc;
use common::{CageId, Diet, DinosaurId, Species};
use park_store::{Dinosaur, DinosaurFilter, DinosaurStore};

use crate::commands::NewDinosaur;
use crate::error::{DomainError, StoreContext};

/// Service for registering and looking up dinosaurs.
///
/// Placement is not handled here, see [`OccupancyEngine`](crate::OccupancyEngine).
pub struct DinosaurService<S: DinosaurStore> {
    store: S,
}

impl<S: DinosaurStore> DinosaurService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new, uncaged dinosaur.
    #[tracing::instrument(skip(self))]
    pub async fn create_dinosaur(&self, cmd: NewDinosaur) -> Result<Dinosaur, DomainError> {
        let name = validate_name(&cmd.name)?;
        if cmd.diet != cmd.species.diet() {
            return Err(DomainError::invalid_input(format!(
                "{} is a {} species, not {}",
                cmd.species,
                cmd.species.diet(),
                cmd.diet
            )));
        }

        let dinosaur = Dinosaur::new(name, cmd.species, cmd.diet);
        self.store
            .create_dinosaur(&dinosaur)
            .await
            .context("create dinosaur")?;

        tracing::info!(dinosaur_id = %dinosaur.id, species = %dinosaur.species, "Dinosaur registered");
        Ok(dinosaur)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_dinosaur(&self, id: DinosaurId) -> Result<Dinosaur, DomainError> {
        self.store.get_dinosaur(id).await.context("fetch dinosaur")
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_dinosaurs(&self) -> Result<Vec<Dinosaur>, DomainError> {
        self.store.list_dinosaurs().await.context("list dinosaurs")
    }

    /// Lists a cage's occupants, optionally narrowed to one species.
    ///
    /// An unknown cage yields an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn list_dinosaurs_in_cage(
        &self,
        cage_id: CageId,
        filter: DinosaurFilter,
    ) -> Result<Vec<Dinosaur>, DomainError> {
        self.store
            .list_dinosaurs_by_cage(cage_id, &filter)
            .await
            .context("list cage occupants")
    }

    /// Renames a dinosaur. Renaming to the current name writes nothing.
    #[tracing::instrument(skip(self))]
    pub async fn rename_dinosaur(
        &self,
        id: DinosaurId,
        name: &str,
    ) -> Result<Dinosaur, DomainError> {
        let name = validate_name(name)?;
        let mut dinosaur = self.store.get_dinosaur(id).await.context("fetch dinosaur")?;
        if dinosaur.name == name {
            return Ok(dinosaur);
        }

        let now = Utc::now();
        self.store
            .update_dinosaur_name(id, name, now)
            .await
            .context("rename dinosaur")?;

        dinosaur.name = name.to_string();
        dinosaur.updated_at = now;
        Ok(dinosaur)
    }

    /// Every species the facility knows, with its diet.
    pub fn species_catalog() -> &'static [(Species, Diet)] {
        &Species::ALL
    }
}

fn validate_name(name: &str) -> Result<&str, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        Err(DomainError::invalid_input("name must not be empty"))
    } else {
        Ok(name)
    }
}
