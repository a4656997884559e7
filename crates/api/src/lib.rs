//! HTTP API for the containment facility.
//!
//! Provides REST endpoints for cages, dinosaurs and placements, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use domain::Park;
use metrics_exporter_prometheus::PrometheusHandle;
use park_store::ParkStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ParkStore>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{cages, dinosaurs};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let v1 = Router::new()
        .route("/cages", get(cages::list::<S>).post(cages::create::<S>))
        .route("/cages/{id}", get(cages::get::<S>).patch(cages::update_status::<S>))
        .route("/cages/{id}/dinosaurs", get(cages::list_dinosaurs::<S>))
        .route(
            "/cages/{id}/dinosaurs/{dinosaur_id}",
            put(cages::add_dinosaur::<S>).delete(cages::remove_dinosaur::<S>),
        )
        .route(
            "/dinosaurs",
            get(dinosaurs::list::<S>).post(dinosaurs::create::<S>),
        )
        .route("/dinosaurs/species", get(dinosaurs::species::<S>))
        .route(
            "/dinosaurs/{id}",
            get(dinosaurs::get::<S>).patch(dinosaurs::rename::<S>),
        );

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/v1", v1)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store.
pub fn create_default_state<S: ParkStore>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        park: Park::new(store),
    })
}
