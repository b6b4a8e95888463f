//! HTTP request handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use rodomap_common::model::RecordId;
use rodomap_common::present::{MapView, MemberView};
use rodomap_common::Error;

use crate::api::AppState;
use crate::state::NewOccurrence;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LayersResponse {
    layers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OccurrencesResponse {
    /// Records ranked newest-first, with status badge labels
    occurrences: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
pub struct CreateOccurrenceResponse {
    id: RecordId,
    /// Cluster the new record landed in, for immediate popup focus
    cluster: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SelectionRequest {
    id: RecordId,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    id: Option<RecordId>,
    /// Cluster whose popup should be re-opened
    cluster: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ModelViewerResponse {
    id: RecordId,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

fn error_response(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/layers - names of the successfully loaded layers
pub async fn get_layers(State(app): State<AppState>) -> Json<LayersResponse> {
    Json(LayersResponse {
        layers: app.state.layer_names(),
    })
}

/// GET /api/layers/{name} - raw layer GeoJSON passthrough
pub async fn get_layer(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    app.state
        .layer(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| error_response(Error::NotFound(format!("layer {}", name))))
}

/// GET /api/map - draw-ordered features, cluster popups, id bindings
pub async fn get_map(State(app): State<AppState>) -> Json<MapView> {
    Json(app.state.map_view().await)
}

/// GET /api/occurrences - all records ranked newest-first
pub async fn get_occurrences(State(app): State<AppState>) -> Json<OccurrencesResponse> {
    Json(OccurrencesResponse {
        occurrences: app.state.history().await,
    })
}

/// POST /api/occurrences - append a submitted record
pub async fn create_occurrence(
    State(app): State<AppState>,
    Json(submission): Json<NewOccurrence>,
) -> (StatusCode, Json<CreateOccurrenceResponse>) {
    let record = app.state.add_occurrence(submission).await;
    info!("Created occurrence {}", record.id);

    // The fresh record always carries a coordinate, so it appears in the
    // recomputed bindings
    let cluster = app.state.map_view().await.bindings.get(&record.id).copied();
    (
        StatusCode::CREATED,
        Json(CreateOccurrenceResponse {
            id: record.id,
            cluster,
        }),
    )
}

/// PUT /api/selection - highlight one record
pub async fn set_selection(
    State(app): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let cluster = app
        .state
        .select(request.id)
        .await
        .map_err(error_response)?;
    Ok(Json(SelectionResponse {
        id: Some(request.id),
        cluster,
    }))
}

/// DELETE /api/selection - clear the highlighted record
pub async fn clear_selection(State(app): State<AppState>) -> Json<SelectionResponse> {
    app.state.clear_selection().await;
    Json(SelectionResponse {
        id: None,
        cluster: None,
    })
}

/// POST /api/model3d - fire the 3D viewer trigger hook
pub async fn trigger_model_viewer(State(app): State<AppState>) -> Json<ModelViewerResponse> {
    Json(ModelViewerResponse {
        id: app.state.trigger_model_viewer(),
    })
}
