//! HTTP route handlers.

pub mod cages;
pub mod dinosaurs;
pub mod health;
pub mod metrics;

use domain::Park;
use park_store::ParkStore;
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ParkStore> {
    pub park: Park<S>,
}

fn parse_id<T: From<Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
