//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use park_store::InMemoryParkStore;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let (app, _) = setup_with_state();
    app
}

fn setup_with_state() -> (axum::Router, Arc<api::AppState<InMemoryParkStore>>) {
    let state = api::create_default_state(InMemoryParkStore::new());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_cage(app: &axum::Router, cage_type: &str, capacity: u32) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/v1/cages",
        Some(json!({ "type": cage_type, "capacity": capacity, "status": "ACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["cage"]["id"].as_str().unwrap().to_string()
}

async fn create_dinosaur(app: &axum::Router, name: &str, species: &str, diet: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/v1/dinosaurs",
        Some(json!({ "name": name, "species": species, "diet": diet })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["dinosaur"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_create_and_get_cage() {
    let app = setup();
    let (status, created) = send(
        &app,
        "POST",
        "/v1/cages",
        Some(json!({ "type": "carnivore", "capacity": 2, "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["cage"]["type"], "CARNIVORE");
    assert_eq!(created["cage"]["status"], "ACTIVE");
    assert_eq!(created["cage"]["current_capacity"], 0);

    let id = created["cage"]["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/v1/cages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["cage"]["id"], id);
    assert_eq!(fetched["cage"]["capacity"], 2);
    assert_eq!(fetched["cage"]["dinosaurs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_cage_reports_every_invalid_field() {
    let app = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/v1/cages",
        Some(json!({ "type": "aquatic", "capacity": -1, "status": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
    assert_eq!(json["details"]["type"], "is invalid");
    assert_eq!(json["details"]["capacity"], "is invalid");
    assert_eq!(json["details"]["status"], "is invalid");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/cages")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/v1/cages/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "bad_request");

    let fake_id = uuid::Uuid::new_v4();
    let (status, json) = send(&app, "GET", &format!("/v1/cages/{fake_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");

    let (status, _) = send(&app, "GET", &format!("/v1/dinosaurs/{fake_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_cages_by_status() {
    let app = setup();
    let id = create_cage(&app, "HERBIVORE", 2).await;
    create_cage(&app, "CARNIVORE", 2).await;

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/v1/cages/{id}"),
        Some(json!({ "status": "DOWN" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = send(&app, "GET", "/v1/cages", None).await;
    assert_eq!(all["cages"].as_array().unwrap().len(), 2);

    let (_, down) = send(&app, "GET", "/v1/cages?status=down", None).await;
    let down = down["cages"].as_array().unwrap();
    assert_eq!(down.len(), 1);
    assert_eq!(down[0]["id"], id.as_str());

    let (status, _) = send(&app, "GET", "/v1/cages?status=sleeping", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dinosaur_lifecycle() {
    let app = setup();
    let id = create_dinosaur(&app, "Blue", "velociraptor", "carnivore").await;

    let (status, fetched) = send(&app, "GET", &format!("/v1/dinosaurs/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["dinosaur"]["species"], "Velociraptor");
    assert_eq!(fetched["dinosaur"]["diet"], "CARNIVORE");
    assert!(fetched["dinosaur"].get("cage_id").is_none());

    let (status, renamed) = send(
        &app,
        "PATCH",
        &format!("/v1/dinosaurs/{id}"),
        Some(json!({ "name": "Charlie" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["dinosaur"]["name"], "Charlie");

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/v1/dinosaurs/{id}"),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["name"], "is invalid");

    let (_, all) = send(&app, "GET", "/v1/dinosaurs", None).await;
    assert_eq!(all["dinosaurs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_dinosaur_validation() {
    let app = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/v1/dinosaurs",
        Some(json!({ "name": "", "species": "Dodo", "diet": "omnivore" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["name"], "is invalid");
    assert_eq!(json["details"]["species"], "is invalid");
    assert_eq!(json["details"]["diet"], "is invalid");

    let (status, json) = send(
        &app,
        "POST",
        "/v1/dinosaurs",
        Some(json!({ "name": "Rex", "species": "Tyrannosaurus", "diet": "HERBIVORE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
}

#[tokio::test]
async fn test_species_catalog() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/v1/dinosaurs/species", None).await;
    assert_eq!(status, StatusCode::OK);

    let species = json["species"].as_array().unwrap();
    assert_eq!(species.len(), 8);
    assert!(
        species
            .iter()
            .any(|s| s["species"] == "Triceratops" && s["diet"] == "HERBIVORE")
    );
}

#[tokio::test]
async fn test_place_and_remove_dinosaur() {
    let (app, state) = setup_with_state();
    let cage_id = create_cage(&app, "CARNIVORE", 2).await;
    let rex = create_dinosaur(&app, "Rex", "Tyrannosaurus", "CARNIVORE").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/v1/cages/{cage_id}/dinosaurs/{rex}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["cage"]["current_capacity"], 1);
    assert_eq!(json["cage"]["dinosaurs"][0]["id"], rex.as_str());
    assert_eq!(json["cage"]["dinosaurs"][0]["cage_id"], cage_id.as_str());

    let (status, occupants) = send(
        &app,
        "GET",
        &format!("/v1/cages/{cage_id}/dinosaurs?species=tyrannosaurus"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(occupants["dinosaurs"].as_array().unwrap().len(), 1);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/v1/cages/{cage_id}/dinosaurs/{rex}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cage"]["current_capacity"], 0);

    let dinosaur = state
        .park
        .dinosaurs
        .get_dinosaur(rex.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(dinosaur.cage_id, None);
}

#[tokio::test]
async fn test_rule_violations_are_conflicts() {
    let app = setup();
    let cage_id = create_cage(&app, "CARNIVORE", 1).await;
    let herbivore_cage = create_cage(&app, "HERBIVORE", 1).await;
    let rex = create_dinosaur(&app, "Rex", "Tyrannosaurus", "CARNIVORE").await;
    let blue = create_dinosaur(&app, "Blue", "Velociraptor", "CARNIVORE").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/v1/cages/{herbivore_cage}/dinosaurs/{rex}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "type_mismatch");

    send(&app, "PUT", &format!("/v1/cages/{cage_id}/dinosaurs/{rex}"), None).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/v1/cages/{cage_id}/dinosaurs/{blue}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "cage_at_capacity");

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/v1/cages/{cage_id}"),
        Some(json!({ "status": "DOWN" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "power_down_with_occupants");

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/v1/cages/{herbivore_cage}/dinosaurs/{rex}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "empty_cage_removal");
}

#[tokio::test]
async fn test_powered_down_cage_refuses_placement() {
    let app = setup();
    let (status, created) = send(
        &app,
        "POST",
        "/v1/cages",
        Some(json!({ "type": "HERBIVORE", "capacity": 3, "status": "DOWN" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cage_id = created["cage"]["id"].as_str().unwrap().to_string();
    let trike = create_dinosaur(&app, "Sarah", "Triceratops", "HERBIVORE").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/v1/cages/{cage_id}/dinosaurs/{trike}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "cage_powered_down");

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/v1/cages/{cage_id}"),
        Some(json!({ "status": "ACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cage"]["status"], "ACTIVE");
}

#[tokio::test]
async fn test_repeated_padded_rename_keeps_timestamp() {
    let app = setup();
    let id = create_dinosaur(&app, "Rex", "Tyrannosaurus", "CARNIVORE").await;
    let uri = format!("/v1/dinosaurs/{id}");

    let (status, first) = send(&app, "PATCH", &uri, Some(json!({ "name": "Rexy " }))).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["dinosaur"]["name"], "Rexy");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, second) = send(&app, "PATCH", &uri, Some(json!({ "name": "Rexy " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cage_responses_list_every_counted_occupant() {
    let app = setup();
    let cage_id = create_cage(&app, "HERBIVORE", 8).await;

    let mut ids = Vec::new();
    for name in ["A", "B", "C", "D", "E", "F"] {
        ids.push(create_dinosaur(&app, name, "Triceratops", "HERBIVORE").await);
    }

    let mut handles = Vec::new();
    for id in ids {
        let app = app.clone();
        let uri = format!("/v1/cages/{cage_id}/dinosaurs/{id}");
        handles.push(tokio::spawn(async move { send(&app, "PUT", &uri, None).await }));
    }
    for handle in handles {
        let (status, json) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        let listed = json["cage"]["dinosaurs"].as_array().unwrap().len() as u64;
        assert_eq!(json["cage"]["current_capacity"].as_u64(), Some(listed));
    }

    let (_, cage) = send(&app, "GET", &format!("/v1/cages/{cage_id}"), None).await;
    assert_eq!(cage["cage"]["current_capacity"], 6);
    assert_eq!(cage["cage"]["dinosaurs"].as_array().unwrap().len(), 6);
}
