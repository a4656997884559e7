//! Persistence for cages and dinosaurs.
//!
//! Provides the [`CageStore`] and [`DinosaurStore`] traits with an in-memory
//! implementation for tests and a PostgreSQL implementation for deployments.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{CageId, CageStatus, CageType, Diet, DinosaurId, Species};
pub use error::{Result, StoreError};
pub use memory::InMemoryParkStore;
pub use model::{Cage, Dinosaur, OccupancyUpdate};
pub use postgres::PostgresParkStore;
pub use query::{CageFilter, DinosaurFilter};
pub use store::{CageStore, DinosaurStore, ParkStore};
