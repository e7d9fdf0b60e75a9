// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mock server: the HTTP surface over the profile store, wrapped with
//! failure injection.
//!
//! Routes (JSON bodies, UTF-8):
//!
//! | Method & path | Success | Injected failure |
//! |---|---|---|
//! | GET /api/profile | full profile | 500 (10%), 1–2 s delay |
//! | PUT /api/profile/sections/:section_id | updated section | 409 (55%), 500 (30%), 0.5–1 s delay |
//! | PUT /api/profile/photo | `{photoUri}` | 500 (20%), 3–5 s delay |
//! | GET /api/profile/progress | progress summary | none |
//!
//! Every error response is `{ "error": "<message>" }` with the status as
//! discriminant. A handler future dropped on client disconnect abandons its
//! pending simulated delay.

pub mod failure;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config::SimulatorConfig;
use crate::profile::{Profile, ProfileSection, ProgressSummary, SectionStatus};
use crate::store::{ProfileStore, StoreError};

use failure::{ApiError, FailureSimulator};

/// Shared server state: one store, one simulator.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProfileStore>,
    pub simulator: Arc<FailureSimulator>,
}

impl AppState {
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            store: Arc::new(ProfileStore::new()),
            simulator: Arc::new(FailureSimulator::new(config)),
        }
    }

    #[must_use]
    pub fn with_simulator(store: Arc<ProfileStore>, simulator: Arc<FailureSimulator>) -> Self {
        Self { store, simulator }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(err.to_string()),
        }
    }
}

/// `PUT /api/profile/sections/:section_id` request body.
#[derive(Debug, Deserialize)]
pub struct UpdateSectionRequest {
    pub status: SectionStatus,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

/// `PUT /api/profile/photo` request and response bodies.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoBody {
    pub photo_uri: String,
}

/// Build the API router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile/sections/:section_id", put(put_section))
        .route("/api/profile/photo", put(put_photo))
        .route("/api/profile/progress", get(get_progress))
        .with_state(state)
}

/// GET /api/profile
#[tracing::instrument(skip(state))]
async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    info!("GET /api/profile");
    let failure = state.simulator.config().profile_read.clone();
    state.simulator.inject(&failure).await.map_err(|err| {
        crate::metrics::record_injected_failure("profile_read", err.status.as_u16());
        err
    })?;

    crate::metrics::record_request("profile_read", "success");
    Ok(Json(state.store.profile()))
}

/// PUT /api/profile/sections/:section_id
#[tracing::instrument(skip(state, body), fields(section_id = %section_id))]
async fn put_section(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
    Json(body): Json<UpdateSectionRequest>,
) -> Result<Json<ProfileSection>, ApiError> {
    info!("PUT /api/profile/sections/{section_id}");
    let failure = state.simulator.config().section_update.clone();
    state.simulator.inject(&failure).await.map_err(|err| {
        crate::metrics::record_injected_failure("section_update", err.status.as_u16());
        err
    })?;

    let section = state.store.update_section(&section_id, body.status, body.data)?;
    crate::metrics::record_request("section_update", "success");
    Ok(Json(section))
}

/// PUT /api/profile/photo
#[tracing::instrument(skip(state, body))]
async fn put_photo(
    State(state): State<AppState>,
    Json(body): Json<PhotoBody>,
) -> Result<Json<PhotoBody>, ApiError> {
    info!("PUT /api/profile/photo");
    // A client disconnect drops this future mid-delay, so an abandoned
    // upload never reaches the store.
    let failure = state.simulator.config().photo_upload.clone();
    state.simulator.inject(&failure).await.map_err(|err| {
        crate::metrics::record_injected_failure("photo_upload", err.status.as_u16());
        ApiError {
            status: err.status,
            message: "Upload failed. Please try again.".to_string(),
        }
    })?;

    let section = state.store.update_photo(&body.photo_uri)?;
    let photo_uri = section.photo_uri.unwrap_or(body.photo_uri);
    crate::metrics::record_request("photo_upload", "success");
    Ok(Json(PhotoBody { photo_uri }))
}

/// GET /api/profile/progress — no injected delay or failure.
async fn get_progress(State(state): State<AppState>) -> Json<ProgressSummary> {
    info!("GET /api/profile/progress");
    crate::metrics::record_request("progress_read", "success");
    Json(state.store.progress())
}

/// Bind and serve until the process is stopped. Logs the endpoint table and
/// injected rates at startup.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let sim = state.simulator.config().clone();
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    let addr = listener.local_addr()?;

    info!("Server running on http://{addr}");
    info!("  GET  /api/profile");
    info!("  PUT  /api/profile/sections/:section_id");
    info!("  PUT  /api/profile/photo");
    info!("  GET  /api/profile/progress");
    info!(
        "Failure rates: profile {}% error, section {}% conflict / {}% error, photo {}% error",
        sim.profile_read.server_error_rate * 100.0,
        sim.section_update.conflict_rate * 100.0,
        sim.section_update.server_error_rate * 100.0,
        sim.photo_upload.server_error_rate * 100.0,
    );

    axum::serve(listener, router).await
}
