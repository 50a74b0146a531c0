//! Mock backend serving canned tracks.
//!
//! Routes live under `/api`:
//!
//! - `GET /api/moods` and `GET /api/genres` return the fixed choice lists.
//! - `POST /api/generate` waits `generate_delay` to mimic generation, then
//!   returns a copy of a canned sample with a fresh id and title suffix.
//! - `GET /api/health` is a liveness check.
pub mod catalog;

pub use catalog::{Catalog, FALLBACK_KEY, GENRES, MOODS};

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{GenerateRequest, HealthStatus, Track};

#[derive(Clone)]
pub struct ServerState {
    pub catalog: Arc<Catalog>,
    pub generate_delay: Duration,
}

impl ServerState {
    pub fn new(generate_delay: Duration) -> Self {
        Self {
            catalog: Arc::new(Catalog::default()),
            generate_delay,
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/moods", get(moods))
        .route("/api/genres", get(genres))
        .route("/api/generate", post(generate))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn moods() -> Json<Vec<&'static str>> {
    Json(MOODS.to_vec())
}

async fn genres() -> Json<Vec<&'static str>> {
    Json(GENRES.to_vec())
}

async fn generate(
    State(state): State<ServerState>,
    Json(request): Json<GenerateRequest>,
) -> std::result::Result<Json<Track>, StatusCode> {
    debug!("Generating {} / {}", request.mood, request.genre);

    tokio::time::sleep(state.generate_delay).await;

    match state.catalog.generate(&request.mood, &request.genre) {
        Some(track) => {
            info!("Generated {} ({})", track.title, track.id);
            Ok(Json(track))
        }
        None => {
            warn!("No samples for {} / {}", request.mood, request.genre);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}
