use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let devices = state.registry.devices().await.map(|d| d.len()).unwrap_or(0);

    (StatusCode::OK,
        Json(json!({
        "status": "im ready",
        "UTC_time": chrono::Utc::now().to_rfc2822(),
        "devices": devices,
        "subscribers": state.publisher.subscribers(),
    })))
}
