use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let protocol = state.protocol.lock().await;
    Json(serde_json::json!({
        "status": "ready",
        "activePositions": protocol.state().ranking.len(),
        "operations": protocol.operations().len(),
    }))
}
