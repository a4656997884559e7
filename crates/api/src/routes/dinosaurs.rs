//! Dinosaur registration and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CageId, Diet, DinosaurId, Species};
use domain::{DinosaurService, NewDinosaur};
use park_store::{Dinosaur, ParkStore};
use serde::{Deserialize, Serialize};

use super::{AppState, parse_id};
use crate::error::{ApiError, Validator};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateDinosaurRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub diet: String,
}

#[derive(Deserialize)]
pub struct RenameDinosaurRequest {
    #[serde(default)]
    pub name: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct DinosaurResponse {
    pub id: DinosaurId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cage_id: Option<CageId>,
    pub name: String,
    pub species: Species,
    pub diet: Diet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Dinosaur> for DinosaurResponse {
    fn from(d: Dinosaur) -> Self {
        Self {
            id: d.id,
            cage_id: d.cage_id,
            name: d.name,
            species: d.species,
            diet: d.diet,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct DinosaurEnvelope {
    pub dinosaur: DinosaurResponse,
}

#[derive(Serialize)]
pub struct DinosaursEnvelope {
    pub dinosaurs: Vec<DinosaurResponse>,
}

impl From<Vec<Dinosaur>> for DinosaursEnvelope {
    fn from(dinosaurs: Vec<Dinosaur>) -> Self {
        Self {
            dinosaurs: dinosaurs.into_iter().map(DinosaurResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct SpeciesEntry {
    pub species: Species,
    pub diet: Diet,
}

#[derive(Serialize)]
pub struct SpeciesEnvelope {
    pub species: Vec<SpeciesEntry>,
}

// -- Handlers --

/// POST /v1/dinosaurs — register a new dinosaur.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateDinosaurRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DinosaurEnvelope>), ApiError> {
    let Json(req) = payload?;

    let mut validator = Validator::new();
    validator.ensure("name", !req.name.trim().is_empty());
    let species = validator.check("species", req.species.parse::<Species>());
    let diet = validator.check("diet", req.diet.parse::<Diet>());
    let (species, diet) = validator.finish(species.zip(diet))?;

    let dinosaur = state
        .park
        .dinosaurs
        .create_dinosaur(NewDinosaur::new(req.name, species, diet))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DinosaurEnvelope {
            dinosaur: dinosaur.into(),
        }),
    ))
}

/// GET /v1/dinosaurs — list every dinosaur.
#[tracing::instrument(skip(state))]
pub async fn list<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DinosaursEnvelope>, ApiError> {
    let dinosaurs = state.park.dinosaurs.list_dinosaurs().await?;
    Ok(Json(dinosaurs.into()))
}

/// GET /v1/dinosaurs/species — the species catalog.
pub async fn species<S: ParkStore>() -> Json<SpeciesEnvelope> {
    let species = DinosaurService::<S>::species_catalog()
        .iter()
        .map(|&(species, diet)| SpeciesEntry { species, diet })
        .collect();
    Json(SpeciesEnvelope { species })
}

/// GET /v1/dinosaurs/:id — fetch one dinosaur.
#[tracing::instrument(skip(state))]
pub async fn get<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DinosaurEnvelope>, ApiError> {
    let id: DinosaurId = parse_id(&id)?;
    let dinosaur = state.park.dinosaurs.get_dinosaur(id).await?;
    Ok(Json(DinosaurEnvelope {
        dinosaur: dinosaur.into(),
    }))
}

/// PATCH /v1/dinosaurs/:id — rename a dinosaur.
#[tracing::instrument(skip(state, payload))]
pub async fn rename<S: ParkStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<RenameDinosaurRequest>, JsonRejection>,
) -> Result<Json<DinosaurEnvelope>, ApiError> {
    let id: DinosaurId = parse_id(&id)?;
    let Json(req) = payload?;

    let mut validator = Validator::new();
    validator.ensure("name", !req.name.trim().is_empty());
    validator.finish(Some(()))?;

    let dinosaur = state.park.dinosaurs.rename_dinosaur(id, &req.name).await?;
    Ok(Json(DinosaurEnvelope {
        dinosaur: dinosaur.into(),
    }))
}
