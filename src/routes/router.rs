use axum::{Router, routing::{get, post}};
use tower_http::trace::TraceLayer;

use crate::handlers::{AppState, events, handle_probe, health};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/probe", post(handle_probe))
        .route("/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
