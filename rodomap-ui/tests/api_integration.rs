//! Integration tests for the viewer API
//!
//! Exercises the complete surface: health, layer passthrough, the map view,
//! the ranked occurrence list, record creation, selection, and the 3D
//! viewer trigger hook.

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use rodomap_ui::api::{create_router, AppState};
use rodomap_ui::loader::LoadedData;
use rodomap_ui::state::SharedState;

use rodomap_common::normalize;

/// Build a router over a small in-memory dataset
fn setup_test_server() -> (axum::Router, Arc<SharedState>) {
    let raw = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "id_ocorrencia": 1,
                    "status": "Resolvido",
                    "tipo": "Alagamento",
                    "data_hora": "01/06/2024 08:00",
                    "Local": "Ponte do Rio"
                },
                "geometry": { "type": "Point", "coordinates": [-50.1, -29.6] }
            },
            {
                "type": "Feature",
                "properties": {
                    "id_ocorrencia": 3,
                    "status": "Não Resolvido",
                    "tipo": "Queda de barreira",
                    "data_hora": "25/12/2024 14:30",
                    "Local": "Ponte do Rio"
                },
                "geometry": { "type": "Point", "coordinates": [-50.1, -29.600000000001] }
            },
            {
                "type": "Feature",
                "properties": {
                    "id_ocorrencia": 7,
                    "status": "Em Andamento",
                    "tipo": "Deslizamento",
                    "data_hora": "10/03/2024"
                },
                "geometry": { "type": "Point", "coordinates": [-50.2, -29.6] }
            }
        ]
    });
    let collection = normalize::normalize_layer(raw);
    let records = normalize::extract_occurrences(&collection);

    let mut layers = BTreeMap::new();
    layers.insert(
        "ocorrencias_consolidated".to_string(),
        serde_json::to_value(&collection).unwrap(),
    );

    let state = Arc::new(SharedState::new(LoadedData { layers, records }));
    let app_state = AppState {
        state: Arc::clone(&state),
        data_folder: std::env::temp_dir(),
        port: 5850,
    };
    (create_router(app_state), state)
}

/// Make one request against the in-memory router
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        _ => panic!("Unsupported method"),
    };

    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).ok();
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_test_server();
    let (status, body) = make_request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rodomap-ui");
}

#[tokio::test]
async fn test_layer_passthrough() {
    let (app, _) = setup_test_server();

    let (status, body) = make_request(&app, "GET", "/api/layers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["layers"], json!(["ocorrencias_consolidated"]));

    let (status, body) =
        make_request(&app, "GET", "/api/layers/ocorrencias_consolidated", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "FeatureCollection");

    let (status, _) = make_request(&app, "GET", "/api/layers/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_map_view_clusters_and_draw_order() {
    let (app, _) = setup_test_server();
    let (status, body) = make_request(&app, "GET", "/api/map", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();

    let clusters = body["clusters"].as_array().unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0]["count"], 2);
    // Pending member drives the cluster color
    assert_eq!(clusters[0]["color"], "#ef4444");
    // Members newest first
    assert_eq!(clusters[0]["members"][0]["id"], 3);

    // Pending record drawn last (on top)
    let features = body["features"]["features"].as_array().unwrap();
    assert_eq!(
        features.last().unwrap()["properties"]["id_ocorrencia"],
        json!(3)
    );

    // Co-located records bind to the same cluster
    assert_eq!(body["bindings"]["1"], body["bindings"]["3"]);
}

#[tokio::test]
async fn test_occurrence_list_ranked_newest_first() {
    let (app, _) = setup_test_server();
    let (status, body) = make_request(&app, "GET", "/api/occurrences", None).await;
    assert_eq!(status, StatusCode::OK);
    let occurrences = body.unwrap()["occurrences"].as_array().unwrap().to_vec();
    let ids: Vec<i64> = occurrences
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1, 7]);
    assert_eq!(occurrences[0]["status_label"], "pending");
}

#[tokio::test]
async fn test_create_occurrence_folds_into_views() {
    let (app, _) = setup_test_server();

    let (status, body) = make_request(
        &app,
        "POST",
        "/api/occurrences",
        Some(json!({
            "kind": "Alagamento",
            "status": "Em Andamento",
            "description": "Pista alagada",
            "recorded_at": "26/12/2024 09:00",
            "lon": -50.1,
            "lat": -29.6
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let body = body.unwrap();
    // Existing ids {1, 3, 7} -> next is 8
    assert_eq!(body["id"], 8);
    // Lands in the existing co-located cluster
    assert_eq!(body["cluster"], 0);

    // Visible in the ranked list, newest first
    let (_, body) = make_request(&app, "GET", "/api/occurrences", None).await;
    let ids: Vec<i64> = body.unwrap()["occurrences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![8, 3, 1, 7]);

    // And in the map view
    let (_, body) = make_request(&app, "GET", "/api/map", None).await;
    let body = body.unwrap();
    assert_eq!(body["clusters"][0]["count"], 3);
}

#[tokio::test]
async fn test_selection_lifecycle() {
    let (app, state) = setup_test_server();

    // Unknown id is rejected
    let (status, _) =
        make_request(&app, "PUT", "/api/selection", Some(json!({ "id": 99 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Selecting a clustered record returns its popup binding
    let (status, body) =
        make_request(&app, "PUT", "/api/selection", Some(json!({ "id": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["cluster"], 0);
    assert_eq!(state.selection().await, Some(1));

    // The selected resolved record now drives the cluster color and sits
    // on top of the draw stack
    let (_, body) = make_request(&app, "GET", "/api/map", None).await;
    let body = body.unwrap();
    assert_eq!(body["clusters"][0]["color"], "#22c55e");
    let features = body["features"]["features"].as_array().unwrap();
    assert_eq!(
        features.last().unwrap()["properties"]["id_ocorrencia"],
        json!(1)
    );
    assert_eq!(body["clusters"][0]["members"][1]["highlighted"], json!(true));

    // Clearing restores the status ordering
    let (status, _) = make_request(&app, "DELETE", "/api/selection", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.selection().await, None);
}

#[tokio::test]
async fn test_model_viewer_trigger() {
    let (app, state) = setup_test_server();
    let mut rx = state.events.subscribe();

    let (status, body) = make_request(&app, "POST", "/api/model3d", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["id"], 414);

    match rx.recv().await.unwrap() {
        rodomap_common::events::MapEvent::OpenModelViewer { id, .. } => assert_eq!(id, 414),
        other => panic!("unexpected event: {:?}", other),
    }
}
