//! REST API for the viewer service

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::SharedState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Viewer state (records, selection, event bus)
    pub state: Arc<SharedState>,
    /// Data folder served at /data
    pub data_folder: PathBuf,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(app_state: AppState) -> Router {
    let data_dir = ServeDir::new(&app_state.data_folder);

    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        .nest("/api", Router::new()
            // Layer access
            .route("/layers", get(handlers::get_layers))
            .route("/layers/:name", get(handlers::get_layer))

            // Map collaborator: draw-ordered features + cluster popups
            .route("/map", get(handlers::get_map))

            // List and record-creation collaborators
            .route("/occurrences", get(handlers::get_occurrences))
            .route("/occurrences", post(handlers::create_occurrence))

            // Selection state
            .route("/selection", put(handlers::set_selection))
            .route("/selection", delete(handlers::clear_selection))

            // 3D model viewer trigger hook
            .route("/model3d", post(handlers::trigger_model_viewer))

            // SSE events
            .route("/events", get(sse::event_stream))
        )

        // The raw layer files, served like the original static hosting
        .nest_service("/data", data_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Health check endpoint
async fn health_check(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "rodomap-ui",
        "version": env!("CARGO_PKG_VERSION"),
        "port": app.port,
        "layers": app.state.layer_names(),
    }))
}
