use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tokio::time::timeout;

use super::AppState;
use crate::models::probe::{ProbeRequest, ProbeResponse};

/// Разовый автодетект по адресу, вне цикла опроса
pub async fn handle_probe(
    State(state): State<AppState>,
    Json(params): Json<ProbeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let ip = params.ip.trim();
    if ip.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "ip обязателен".to_string()));
    }
    let port = params.port.unwrap_or(state.snmp_port);

    let work = state
        .detector
        .detect_preferring(ip, port, params.community.as_deref());

    let capabilities = match timeout(state.detection_timeout, work).await {
        Ok(Ok(caps)) => caps,
        Ok(Err(e)) => return Err((StatusCode::BAD_GATEWAY, e.to_string())),
        Err(_) => return Err((
            StatusCode::GATEWAY_TIMEOUT,
            "SNMP probe timeout".to_string(),
        )),
    };

    Ok(Json(ProbeResponse {
        ip: ip.to_string(),
        port,
        capabilities,
    }))
}
