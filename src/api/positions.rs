use crate::api::{parse_address, AppState};
use crate::domain::{Decimal, Position};
use crate::error::AppError;
use crate::orchestration::RankingEntry;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub price: Decimal,
    pub positions: Vec<RankingEntry>,
}

pub async fn get_position(
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Position>, AppError> {
    let owner = parse_address(&owner, "owner")?;
    let protocol = state.protocol.lock().await;
    protocol
        .position(&owner)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no position for {}", owner)))
}

pub async fn get_ranking(State(state): State<AppState>) -> Json<RankingResponse> {
    let protocol = state.protocol.lock().await;
    Json(RankingResponse {
        price: protocol.price(),
        positions: protocol.ranking(),
    })
}
