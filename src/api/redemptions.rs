use crate::api::{parse_address, parse_decimal, AppState};
use crate::domain::Decimal;
use crate::engine::RedemptionHints;
use crate::error::AppError;
use crate::orchestration::RedemptionOutcome;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RedemptionRequest {
    pub redeemer: String,
    pub amount: Decimal,
}

pub async fn post_redemption(
    State(state): State<AppState>,
    Json(request): Json<RedemptionRequest>,
) -> Result<Json<RedemptionOutcome>, AppError> {
    let redeemer = parse_address(&request.redeemer, "redeemer")?;
    let mut protocol = state.protocol.lock().await;
    let outcome = protocol.redeem(&redeemer, request.amount)?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct RedemptionHintsQuery {
    pub amount: String,
}

pub async fn get_redemption_hints(
    Query(params): Query<RedemptionHintsQuery>,
    State(state): State<AppState>,
) -> Result<Json<RedemptionHints>, AppError> {
    let amount = parse_decimal(&params.amount, "amount")?;
    if !amount.is_positive() {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }
    let protocol = state.protocol.lock().await;
    Ok(Json(protocol.redemption_hints(amount)))
}
