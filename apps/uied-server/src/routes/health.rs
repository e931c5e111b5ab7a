//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub longest_edge: u32,
    pub detector: DetectorStatus,
}

#[derive(Serialize)]
pub struct DetectorStatus {
    pub name: &'static str,
    pub available: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let detection = state.detection();
    let detector = detection.detector();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "uied-server",
        longest_edge: detection.longest_edge(),
        detector: DetectorStatus {
            name: detector.name(),
            available: detector.is_available().await,
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
