use crate::api::{parse_decimal, AppState};
use crate::error::AppError;
use crate::orchestration::InsertHintView;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InsertHintQuery {
    pub collateral: String,
    pub debt: String,
}

/// Upper/lower hints a caller can pass to a position spell with these balances.
pub async fn get_insert_hint(
    Query(params): Query<InsertHintQuery>,
    State(state): State<AppState>,
) -> Result<Json<InsertHintView>, AppError> {
    let collateral = parse_decimal(&params.collateral, "collateral")?;
    let debt = parse_decimal(&params.debt, "debt")?;
    if collateral.is_negative() || debt.is_negative() {
        return Err(AppError::BadRequest(
            "collateral and debt must not be negative".into(),
        ));
    }
    let protocol = state.protocol.lock().await;
    Ok(Json(protocol.insert_hint(collateral, debt)?))
}
