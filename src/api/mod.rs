pub mod balances;
pub mod cast;
pub mod events;
pub mod health;
pub mod hints;
pub mod positions;
pub mod redemptions;

use crate::domain::{Address, Decimal};
use crate::error::AppError;
use crate::orchestration::Protocol;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// The protocol is the single serialising authority: each request holds the
/// lock for one batch, redemption or event.
#[derive(Clone)]
pub struct AppState {
    pub protocol: Arc<Mutex<Protocol>>,
}

impl AppState {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol: Arc::new(Mutex::new(protocol)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/cast", post(cast::post_cast))
        .route("/v1/redemptions", post(redemptions::post_redemption))
        .route("/v1/redemptions/hints", get(redemptions::get_redemption_hints))
        .route("/v1/events", post(events::post_event))
        .route("/v1/fund", post(balances::post_fund))
        .route("/v1/balances", get(balances::get_balances))
        .route("/v1/positions/:owner", get(positions::get_position))
        .route("/v1/ranking", get(positions::get_ranking))
        .route("/v1/hints/insert", get(hints::get_insert_hint))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_address(raw: &str, field: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} address", field)))
}

pub(crate) fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, AppError> {
    Decimal::from_str_canonical(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {}: must be a decimal number", field)))
}
