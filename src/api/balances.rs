use crate::api::{parse_address, AppState};
use crate::domain::{Address, Asset, Decimal};
use crate::error::AppError;
use crate::orchestration::AccountView;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BalancesQuery {
    pub address: String,
}

pub async fn get_balances(
    Query(params): Query<BalancesQuery>,
    State(state): State<AppState>,
) -> Result<Json<AccountView>, AppError> {
    let address = parse_address(&params.address, "account")?;
    let protocol = state.protocol.lock().await;
    Ok(Json(protocol.account(&address)))
}

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub address: String,
    pub asset: Asset,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct FundResponse {
    pub address: Address,
    pub asset: Asset,
    pub balance: Decimal,
}

pub async fn post_fund(
    State(state): State<AppState>,
    Json(request): Json<FundRequest>,
) -> Result<Json<FundResponse>, AppError> {
    let address = parse_address(&request.address, "account")?;
    let mut protocol = state.protocol.lock().await;
    let balance = protocol.fund(&address, request.asset, request.amount)?;
    Ok(Json(FundResponse {
        address,
        asset: request.asset,
        balance,
    }))
}
