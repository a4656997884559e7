use thiserror::Error;
use uuid::Uuid;

use crate::{CageId, DinosaurId};

/// Errors that can occur when interacting with a park store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A guarded write found the record in a different state than the
    /// caller observed. Nothing was written.
    #[error("Concurrency conflict on {entity} {id}: {detail}")]
    ConcurrencyConflict {
        entity: &'static str,
        id: Uuid,
        detail: String,
    },

    /// A stored value could not be mapped back to a domain value.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn cage_not_found(id: CageId) -> Self {
        StoreError::NotFound {
            entity: "cage",
            id: id.as_uuid(),
        }
    }

    pub fn dinosaur_not_found(id: DinosaurId) -> Self {
        StoreError::NotFound {
            entity: "dinosaur",
            id: id.as_uuid(),
        }
    }

    pub fn cage_conflict(id: CageId, detail: impl Into<String>) -> Self {
        StoreError::ConcurrencyConflict {
            entity: "cage",
            id: id.as_uuid(),
            detail: detail.into(),
        }
    }

    pub fn dinosaur_conflict(id: DinosaurId, detail: impl Into<String>) -> Self {
        StoreError::ConcurrencyConflict {
            entity: "dinosaur",
            id: id.as_uuid(),
            detail: detail.into(),
        }
    }

    /// Returns true for the distinguishable "record does not exist" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
