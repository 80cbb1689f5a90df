use crate::api::AppState;
use crate::domain::{LedgerRecord, PositionEvent};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: &'static str,
    pub records: Vec<LedgerRecord>,
}

pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<PositionEvent>,
) -> Result<Json<EventResponse>, AppError> {
    let mut protocol = state.protocol.lock().await;
    let records = protocol.apply_event(&event)?;
    Ok(Json(EventResponse {
        event: event.kind_name(),
        records,
    }))
}
