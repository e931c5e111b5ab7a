//! Route modules for UIED Server

use axum::{extract::DefaultBodyLimit, Router};

use crate::state::AppState;

pub mod detect;
pub mod health;
pub mod index;

/// Assemble every endpoint around `state`
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .merge(index::router())
        .merge(detect::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
