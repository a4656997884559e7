//! Cage endpoints, including placing dinosaurs into cages.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CageId, CageStatus, CageType, DinosaurId, Species};
use domain::NewCage;
use park_store::{Cage, CageFilter, Dinosaur, DinosaurFilter, ParkStore};
use serde::{Deserialize, Serialize};

use super::dinosaurs::{DinosaurResponse, DinosaursEnvelope};
use super::{AppState, parse_id};
use crate::error::{ApiError, Validator};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCageRequest {
    #[serde(rename = "type", default)]
    pub cage_type: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
pub struct UpdateCageRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCagesQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOccupantsQuery {
    pub species: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CageResponse {
    pub id: CageId,
    #[serde(rename = "type")]
    pub cage_type: CageType,
    pub capacity: u32,
    pub current_capacity: u32,
    pub status: CageStatus,
    pub dinosaurs: Vec<DinosaurResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CageEnvelope {
    pub cage: CageResponse,
}

#[derive(Serialize)]
pub struct CagesEnvelope {
    pub cages: Vec<CageResponse>,
}

impl CageResponse {
    fn new(cage: Cage, dinosaurs: Vec<Dinosaur>) -> Self {
        Self {
            id: cage.id,
            cage_type: cage.cage_type,
            capacity: cage.capacity,
            current_capacity: cage.current_capacity,
            status: cage.status,
            dinosaurs: dinosaurs.into_iter().map(DinosaurResponse::from).collect(),
            created_at: cage.created_at,
            updated_at: cage.updated_at,
        }
    }
}

/// Builds the client view of a cage, reading the cage and its occupants
/// together.
async fn cage_response<S: ParkStore>(
    state: &AppState<S>,
    id: CageId,
) -> Result<CageResponse, ApiError> {
    let (cage, dinosaurs) = state.park.occupancy.cage_with_occupants(id).await?;
    Ok(CageResponse::new(cage, dinosaurs))
}

async fn cage_envelope<S: ParkStore>(
    state: &AppState<S>,
    id: CageId,
) -> Result<Json<CageEnvelope>, ApiError> {
    Ok(Json(CageEnvelope {
        cage: cage_response(state, id).await?,
    }))
}

// -- Handlers --

/// POST /v1/cages — build a new cage.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateCageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CageEnvelope>), ApiError> {
    let Json(req) = payload?;

    let mut validator = Validator::new();
    let cage_type = validator.check("type", req.cage_type.parse::<CageType>());
    let capacity = validator.check(
        "capacity",
        u32::try_from(req.capacity)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(()),
    );
    let status = validator.check("status", req.status.parse::<CageStatus>());
    let (cage_type, (capacity, status)) =
        validator.finish(cage_type.zip(capacity.zip(status)))?;

    let cage = state
        .park
        .cages
        .create_cage(NewCage::new(cage_type, capacity, status))
        .await?;

    let envelope = Json(CageEnvelope {
        cage: CageResponse::new(cage, Vec::new()),
    });
    Ok((StatusCode::CREATED, envelope))
}

/// GET /v1/cages — list cages, optionally by status.
#[tracing::instrument(skip(state))]
pub async fn list<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListCagesQuery>,
) -> Result<Json<CagesEnvelope>, ApiError> {
    let filter = match query.status.as_deref() {
        None | Some("") => CageFilter::new(),
        Some(status) => CageFilter::with_status(
            status
                .parse()
                .map_err(|_| ApiError::BadRequest("Invalid cage status filter.".to_string()))?,
        ),
    };

    let cages = state.park.cages.list_cages(filter).await?;
    let mut responses = Vec::with_capacity(cages.len());
    for cage in cages {
        responses.push(cage_response(&state, cage.id).await?);
    }

    Ok(Json(CagesEnvelope { cages: responses }))
}

/// GET /v1/cages/:id — fetch one cage with its occupants.
#[tracing::instrument(skip(state))]
pub async fn get<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CageEnvelope>, ApiError> {
    let id: CageId = parse_id(&id)?;
    cage_envelope(&state, id).await
}

/// PATCH /v1/cages/:id — power a cage up or down.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCageRequest>, JsonRejection>,
) -> Result<Json<CageEnvelope>, ApiError> {
    let id: CageId = parse_id(&id)?;
    let Json(req) = payload?;

    let mut validator = Validator::new();
    let status = validator.check("status", req.status.parse::<CageStatus>());
    let status = validator.finish(status)?;

    state.park.cages.change_cage_status(id, status).await?;
    cage_envelope(&state, id).await
}

/// GET /v1/cages/:id/dinosaurs — list a cage's occupants, optionally by species.
#[tracing::instrument(skip(state))]
pub async fn list_dinosaurs<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<ListOccupantsQuery>,
) -> Result<Json<DinosaursEnvelope>, ApiError> {
    let id: CageId = parse_id(&id)?;
    let filter = match query.species.as_deref() {
        None | Some("") => DinosaurFilter::new(),
        Some(species) => DinosaurFilter::with_species(
            species
                .parse::<Species>()
                .map_err(|_| ApiError::BadRequest("Invalid species filter.".to_string()))?,
        ),
    };

    let dinosaurs = state
        .park
        .dinosaurs
        .list_dinosaurs_in_cage(id, filter)
        .await?;
    Ok(Json(dinosaurs.into()))
}

/// PUT /v1/cages/:id/dinosaurs/:dinosaur_id — place a dinosaur in a cage.
#[tracing::instrument(skip(state))]
pub async fn add_dinosaur<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, dinosaur_id)): Path<(String, String)>,
) -> Result<Json<CageEnvelope>, ApiError> {
    let id: CageId = parse_id(&id)?;
    let dinosaur_id: DinosaurId = parse_id(&dinosaur_id)?;

    state
        .park
        .occupancy
        .add_dinosaur_to_cage(id, dinosaur_id)
        .await?;
    cage_envelope(&state, id).await
}

/// DELETE /v1/cages/:id/dinosaurs/:dinosaur_id — take a dinosaur out of a cage.
#[tracing::instrument(skip(state))]
pub async fn remove_dinosaur<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, dinosaur_id)): Path<(String, String)>,
) -> Result<Json<CageEnvelope>, ApiError> {
    let id: CageId = parse_id(&id)?;
    let dinosaur_id: DinosaurId = parse_id(&dinosaur_id)?;

    state
        .park
        .occupancy
        .remove_dinosaur_from_cage(id, dinosaur_id)
        .await?;
    cage_envelope(&state, id).await
}
