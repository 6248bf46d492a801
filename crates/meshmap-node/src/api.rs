//! HTTP API for the map node.

use crate::node::MapState;
use crate::reports::{self, Contributor, NodeRow, SampleRow};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use meshmap_core::measure::clamp_location;
use meshmap_core::{NodePlacement, Observation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

type AppState = Arc<MapState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser map clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health (at root and under /api/v1 for compatibility)
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        .route("/ready", get(ready))
        // Coverage samples
        .route("/api/v1/samples", post(ingest_sample))
        .route("/api/v1/samples", get(list_samples))
        // Node placements
        .route("/api/v1/nodes", post(ingest_node))
        // Combined snapshot for map rendering
        .route("/api/v1/map", get(get_map))
        // Contributor digests
        .route("/api/v1/contributors", get(list_contributors))
        .layer(cors)
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Sample endpoints ---

#[derive(Debug, Serialize)]
struct Ack {
    status: &'static str,
}

async fn ingest_sample(
    State(state): State<AppState>,
    Json(obs): Json<Observation>,
) -> Result<Json<Ack>, StatusCode> {
    let now_ms = Utc::now().timestamp_millis();
    let outcome = state
        .engine
        .ingest(&obs, now_ms)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Contributor tracking is best-effort; the merge already happened.
    if let Some(sender) = outcome.sender.as_deref().filter(|s| !s.is_empty()) {
        let day = reports::day_start_ms(now_ms);
        if let Err(e) = state
            .activity
            .record_sighting(&outcome.region, sender, day)
            .await
        {
            warn!("Failed to record sender activity: {}", e);
        }
    }

    Ok(Json(Ack { status: "ok" }))
}

async fn list_samples(
    State(state): State<AppState>,
) -> Result<Json<Vec<SampleRow>>, StatusCode> {
    let rows = reports::sample_rows(&state.engine)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(rows))
}

// --- Node placement endpoints ---

#[derive(Debug, Deserialize)]
struct PlaceNodeRequest {
    id: String,
    name: Option<String>,
    lat: f64,
    lon: f64,
    elev: Option<f64>,
    path: Option<Vec<String>>,
}

async fn ingest_node(
    State(state): State<AppState>,
    Json(req): Json<PlaceNodeRequest>,
) -> Result<Json<Ack>, StatusCode> {
    if req.id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let (lat, lon) = clamp_location(req.lat, req.lon);
    let placement = NodePlacement {
        id: req.id,
        name: req.name.unwrap_or_default(),
        lat,
        lon,
        elev: req.elev.unwrap_or(0.0),
        time: 0,
        path: req
            .path
            .unwrap_or_default()
            .iter()
            .map(|h| h.to_lowercase())
            .collect(),
    };

    let now_ms = Utc::now().timestamp_millis();
    state
        .engine
        .place_node(&placement, now_ms)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(Ack { status: "ok" }))
}

// --- Map snapshot endpoint ---

#[derive(Debug, Serialize)]
struct MapSnapshot {
    samples: Vec<SampleRow>,
    nodes: Vec<NodeRow>,
}

async fn get_map(State(state): State<AppState>) -> Result<Json<MapSnapshot>, StatusCode> {
    let samples = reports::sample_rows(&state.engine)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let nodes = reports::node_rows(&state.engine)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(MapSnapshot { samples, nodes }))
}

// --- Contributor endpoints ---

#[derive(Debug, Deserialize)]
struct ContributorQuery {
    /// Epoch milliseconds; only activity on or after this instant counts.
    #[serde(default)]
    after: i64,
}

async fn list_contributors(
    State(state): State<AppState>,
    Query(query): Query<ContributorQuery>,
) -> Result<Json<Vec<Contributor>>, StatusCode> {
    let contributors = state
        .activity
        .top_contributors(query.after)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(contributors))
}
